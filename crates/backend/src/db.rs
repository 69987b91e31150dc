use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection, RunQueryDsl,
};
use uuid::Uuid;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConn = diesel_async::pooled_connection::deadpool::Object<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    // Parse the connection string and connect with TLS
    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // Spawn the connection task
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    // Build the async connection from the tokio-postgres client
    AsyncPgConnection::try_from(client).await
}

pub fn establish_connection_pool() -> anyhow::Result<DbPool> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup =
        Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));

    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
        database_url,
        manager_config,
    );
    let pool = Pool::builder(config).build()?;

    Ok(pool)
}

pub async fn get_conn(
    pool: &DbPool,
) -> Result<DbConn, diesel_async::pooled_connection::deadpool::PoolError> {
    pool.get().await
}

// User database operations
pub mod users {
    use super::*;
    use crate::models::NewUser;
    use shared_types::User;

    pub async fn get_by_email(
        conn: &mut AsyncPgConnection,
        user_email: &str,
    ) -> anyhow::Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let user = users
            .filter(email.eq(user_email))
            .first::<User>(conn)
            .await
            .optional()?;

        Ok(user)
    }

    /// Look up a user by email, creating the row on first login.
    pub async fn get_or_create_from_google(
        conn: &mut AsyncPgConnection,
        user_email: &str,
        display_name: Option<&str>,
        google_subject: Option<&str>,
    ) -> anyhow::Result<User> {
        use crate::schema::users::dsl::*;

        if let Some(existing) = get_by_email(conn, user_email).await? {
            return Ok(existing);
        }

        let now = chrono::Utc::now();
        let user = diesel::insert_into(users)
            .values(NewUser {
                id: Uuid::new_v4(),
                email: user_email,
                name: display_name,
                google_id: google_subject,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .get_result::<User>(conn)
            .await?;

        Ok(user)
    }
}

// Todo database operations. Every query is scoped to the owning user.
pub mod todos {
    use super::*;
    use crate::models::NewTodo;
    use chrono::{DateTime, Utc};
    use shared_types::Todo;

    #[derive(Debug, AsChangeset)]
    #[diesel(table_name = crate::schema::todos)]
    pub struct TodoChanges<'a> {
        pub title: Option<&'a str>,
        pub description: Option<&'a str>,
        pub is_completed: Option<bool>,
        pub status: Option<&'a str>,
        pub updated_at: DateTime<Utc>,
    }

    pub async fn list_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        skip: i64,
        limit: i64,
        status_filter: Option<&str>,
    ) -> anyhow::Result<Vec<Todo>> {
        use crate::schema::todos::dsl::*;

        let mut query = todos.filter(user_id.eq(owner)).into_boxed();
        if let Some(s) = status_filter {
            query = query.filter(status.eq(s));
        }

        let items = query
            .order_by(created_at.asc())
            .offset(skip)
            .limit(limit)
            .load::<Todo>(conn)
            .await?;

        Ok(items)
    }

    pub async fn get_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        todo_id: Uuid,
    ) -> anyhow::Result<Option<Todo>> {
        use crate::schema::todos::dsl::*;

        let todo = todos
            .filter(id.eq(todo_id))
            .filter(user_id.eq(owner))
            .first::<Todo>(conn)
            .await
            .optional()?;

        Ok(todo)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        todo_title: &str,
        todo_description: Option<&str>,
        todo_status: &str,
    ) -> anyhow::Result<Todo> {
        use crate::schema::todos::dsl::*;

        let now = Utc::now();
        let todo = diesel::insert_into(todos)
            .values(NewTodo {
                id: Uuid::new_v4(),
                user_id: owner,
                title: todo_title,
                description: todo_description,
                is_completed: false,
                status: todo_status,
                created_at: now,
                updated_at: now,
            })
            .get_result::<Todo>(conn)
            .await?;

        Ok(todo)
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        todo_id: Uuid,
        changes: TodoChanges<'_>,
    ) -> anyhow::Result<Todo> {
        use crate::schema::todos::dsl::*;

        let todo = diesel::update(todos.filter(id.eq(todo_id)).filter(user_id.eq(owner)))
            .set(changes)
            .get_result::<Todo>(conn)
            .await?;

        Ok(todo)
    }

    pub async fn delete(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        todo_id: Uuid,
    ) -> anyhow::Result<()> {
        use crate::schema::todos::dsl::*;

        diesel::delete(todos.filter(id.eq(todo_id)).filter(user_id.eq(owner)))
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn ids_by_status(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        todo_status: &str,
    ) -> anyhow::Result<Vec<Uuid>> {
        use crate::schema::todos::dsl::*;

        let ids = todos
            .filter(user_id.eq(owner))
            .filter(status.eq(todo_status))
            .select(id)
            .load::<Uuid>(conn)
            .await?;

        Ok(ids)
    }

    pub async fn delete_by_ids(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        todo_ids: &[Uuid],
    ) -> anyhow::Result<usize> {
        use crate::schema::todos::dsl::*;

        let deleted = diesel::delete(
            todos
                .filter(user_id.eq(owner))
                .filter(id.eq_any(todo_ids.to_vec())),
        )
        .execute(conn)
        .await?;

        Ok(deleted)
    }
}

// Todo photo database operations
pub mod todo_photos {
    use super::*;
    use crate::models::NewTodoPhoto;
    use shared_types::TodoPhoto;

    pub async fn list_for_todo(
        conn: &mut AsyncPgConnection,
        parent: Uuid,
    ) -> anyhow::Result<Vec<TodoPhoto>> {
        use crate::schema::todo_photos::dsl::*;

        let photos = todo_photos
            .filter(todo_id.eq(parent))
            .order_by(created_at.asc())
            .load::<TodoPhoto>(conn)
            .await?;

        Ok(photos)
    }

    pub async fn list_for_todos(
        conn: &mut AsyncPgConnection,
        parents: &[Uuid],
    ) -> anyhow::Result<Vec<TodoPhoto>> {
        use crate::schema::todo_photos::dsl::*;

        let photos = todo_photos
            .filter(todo_id.eq_any(parents.to_vec()))
            .load::<TodoPhoto>(conn)
            .await?;

        Ok(photos)
    }

    /// Fetch a photo only if the joined todo belongs to `owner`.
    pub async fn get_owned(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        photo_id: Uuid,
    ) -> anyhow::Result<Option<TodoPhoto>> {
        use crate::schema::{todo_photos, todos};

        let photo = todo_photos::table
            .inner_join(todos::table)
            .filter(todo_photos::id.eq(photo_id))
            .filter(todos::user_id.eq(owner))
            .select(todo_photos::all_columns)
            .first::<TodoPhoto>(conn)
            .await
            .optional()?;

        Ok(photo)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        parent: Uuid,
        original_filename: &str,
        access_url: &str,
        key: Option<&str>,
    ) -> anyhow::Result<TodoPhoto> {
        use crate::schema::todo_photos::dsl::*;

        let photo = diesel::insert_into(todo_photos)
            .values(NewTodoPhoto {
                id: Uuid::new_v4(),
                todo_id: parent,
                filename: original_filename,
                url: access_url,
                storage_key: key,
                created_at: chrono::Utc::now(),
            })
            .get_result::<TodoPhoto>(conn)
            .await?;

        Ok(photo)
    }

    pub async fn delete(conn: &mut AsyncPgConnection, photo_id: Uuid) -> anyhow::Result<()> {
        use crate::schema::todo_photos::dsl::*;

        diesel::delete(todo_photos.filter(id.eq(photo_id)))
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn delete_for_todos(
        conn: &mut AsyncPgConnection,
        parents: &[Uuid],
    ) -> anyhow::Result<usize> {
        use crate::schema::todo_photos::dsl::*;

        let deleted = diesel::delete(todo_photos.filter(todo_id.eq_any(parents.to_vec())))
            .execute(conn)
            .await?;

        Ok(deleted)
    }
}

// Column settings database operations (one row per user)
pub mod column_settings {
    use super::*;
    use crate::models::{ColumnSettingsRow, NewColumnSettings};
    use diesel::SelectableHelper;

    pub async fn get_by_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
    ) -> anyhow::Result<Option<ColumnSettingsRow>> {
        use crate::schema::user_column_settings::dsl::*;

        let row = user_column_settings
            .filter(user_id.eq(owner))
            .select(ColumnSettingsRow::as_select())
            .first::<ColumnSettingsRow>(conn)
            .await
            .optional()?;

        Ok(row)
    }

    pub async fn insert(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        order_text: &str,
        config_text: &str,
    ) -> anyhow::Result<ColumnSettingsRow> {
        use crate::schema::user_column_settings::dsl::*;

        let now = chrono::Utc::now();
        let row = diesel::insert_into(user_column_settings)
            .values(NewColumnSettings {
                id: Uuid::new_v4(),
                user_id: owner,
                column_order: order_text,
                columns_config: config_text,
                version: 1,
                created_at: now,
                updated_at: now,
            })
            .returning(ColumnSettingsRow::as_returning())
            .get_result::<ColumnSettingsRow>(conn)
            .await?;

        Ok(row)
    }

    /// Optimistically-guarded write of the two board blobs.
    ///
    /// Succeeds only when the row still carries `expected_version`; returns
    /// false when a concurrent writer got there first, in which case the
    /// caller reloads and reapplies its transformation.
    pub async fn update_guarded(
        conn: &mut AsyncPgConnection,
        settings_id: Uuid,
        expected_version: i32,
        order_text: &str,
        config_text: &str,
    ) -> anyhow::Result<bool> {
        use crate::schema::user_column_settings::dsl::*;

        let updated = diesel::update(
            user_column_settings
                .filter(id.eq(settings_id))
                .filter(version.eq(expected_version)),
        )
        .set((
            column_order.eq(order_text),
            columns_config.eq(config_text),
            version.eq(expected_version + 1),
            updated_at.eq(chrono::Utc::now()),
        ))
        .execute(conn)
        .await?;

        Ok(updated == 1)
    }

    pub async fn delete_by_user(conn: &mut AsyncPgConnection, owner: Uuid) -> anyhow::Result<bool> {
        use crate::schema::user_column_settings::dsl::*;

        let deleted = diesel::delete(user_column_settings.filter(user_id.eq(owner)))
            .execute(conn)
            .await?;

        Ok(deleted > 0)
    }
}
