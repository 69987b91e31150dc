use clap::{Parser, Subcommand};
use reqwest::Client;
use shared_types::{ColumnSettingsResponse, CreateTodoRequest, Todo, UpdateTodoRequest};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "board-cli")]
#[command(about = "CLI for managing todos and board columns via the backend API")]
#[command(
    long_about = "A command-line interface for interacting with the todo board backend.\n\n\
    Supports creating, listing, moving, and deleting todos, and inspecting\n\
    or resetting the per-user column layout."
)]
struct Cli {
    /// Backend server URL to connect to.
    ///
    /// The CLI will make HTTP requests to this server's API endpoints.
    /// Use this to connect to a remote server or a different port.
    #[arg(
        short,
        long,
        default_value = "http://localhost:8000",
        env = "TODO_API_URL"
    )]
    base_url: String,

    /// Bearer token for authenticated requests.
    ///
    /// Obtain one by logging in through the browser flow; the frontend
    /// callback URL carries it as the `token` query parameter.
    #[arg(long, env = "BOARD_TOKEN", hide_env_values = true)]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage todos - create, list, move, delete, and mark as done
    Todos {
        #[command(subcommand)]
        action: TodoAction,
    },
    /// Inspect or reset the board column layout
    Columns {
        #[command(subcommand)]
        action: ColumnAction,
    },
}

#[derive(Subcommand)]
enum TodoAction {
    /// List todos with their current status
    ///
    /// Displays todos with a checkbox indicator (○ pending, ✓ completed),
    /// their short ID, status, title, and description.
    List {
        /// Only show todos in this column (e.g. "todo", "inProgress").
        #[arg(short, long, value_name = "STATUS")]
        status: Option<String>,
    },

    /// Create a new todo item
    ///
    /// Creates a todo with the given title. New todos land in the "todo"
    /// column unless a status is given.
    Create {
        /// The title/name of the todo item.
        title: String,

        /// A longer description with additional details about the todo.
        #[arg(short, long, value_name = "TEXT")]
        description: Option<String>,

        /// Column to create the todo in (default "todo").
        #[arg(short, long, value_name = "STATUS")]
        status: Option<String>,
    },

    /// Move a todo to another column
    ///
    /// Updates the todo's status; the board columns follow automatically.
    Move {
        /// The UUID of the todo to move.
        /// Use 'todos list' to find the ID (shown in brackets).
        id: Uuid,

        /// Target column (e.g. "inProgress", "blocked", "done").
        status: String,
    },

    /// Mark a todo as completed
    ///
    /// Shorthand for moving the todo to "done" and setting the completed
    /// flag. The todo will show a ✓ checkmark in the list.
    Done {
        /// The UUID of the todo to mark as completed.
        id: Uuid,
    },

    /// Permanently delete a todo
    ///
    /// This action cannot be undone. The todo, its photos, and its board
    /// entries are all removed.
    Delete {
        /// The UUID of the todo to delete.
        /// Use 'todos list' to find the ID (shown in brackets).
        id: Uuid,
    },

    /// Delete every todo in a column
    ///
    /// This action cannot be undone.
    ClearColumn {
        /// The column to empty (e.g. "done").
        status: String,
    },
}

#[derive(Subcommand)]
enum ColumnAction {
    /// Show the current column layout
    ///
    /// Displays each column in board order with its title and the number
    /// of todos it holds.
    Show,

    /// Reset the column layout to the defaults
    ///
    /// Discards any customization. Todos themselves are untouched.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Todos { action } => {
            handle_todos(&client, &cli.base_url, &cli.token, action).await?
        }
        Commands::Columns { action } => {
            handle_columns(&client, &cli.base_url, &cli.token, action).await?
        }
    }

    Ok(())
}

fn print_todo_line(todo: &Todo) {
    let check = if todo.is_completed { "✓" } else { "○" };
    println!(
        "{} [{}] ({}) {}",
        check,
        &todo.id.to_string()[..8],
        todo.status,
        todo.title
    );
    if let Some(desc) = &todo.description {
        println!("    {}", desc);
    }
}

async fn handle_todos(
    client: &Client,
    base_url: &str,
    token: &str,
    action: TodoAction,
) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/todos", base_url);

    match action {
        TodoAction::List { status } => {
            let mut request = client.get(&url).bearer_auth(token);
            if let Some(status) = &status {
                request = request.query(&[("status", status)]);
            }
            let todos: Vec<Todo> = request.send().await?.error_for_status()?.json().await?;
            if todos.is_empty() {
                println!("No todos found.");
            } else {
                for todo in &todos {
                    print_todo_line(todo);
                }
            }
        }
        TodoAction::Create {
            title,
            description,
            status,
        } => {
            let req = CreateTodoRequest {
                title,
                description,
                status,
            };
            let todo: Todo = client
                .post(&url)
                .bearer_auth(token)
                .json(&req)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!(
                "Created todo: [{}] ({}) {}",
                &todo.id.to_string()[..8],
                todo.status,
                todo.title
            );
        }
        TodoAction::Move { id, status } => {
            let req = UpdateTodoRequest {
                title: None,
                description: None,
                is_completed: None,
                status: Some(status),
            };
            let todo: Todo = client
                .put(format!("{}/{}", url, id))
                .bearer_auth(token)
                .json(&req)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!(
                "Moved todo: [{}] -> {}",
                &todo.id.to_string()[..8],
                todo.status
            );
        }
        TodoAction::Done { id } => {
            let req = UpdateTodoRequest {
                title: None,
                description: None,
                is_completed: Some(true),
                status: Some("done".to_string()),
            };
            let todo: Todo = client
                .put(format!("{}/{}", url, id))
                .bearer_auth(token)
                .json(&req)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!(
                "Marked as done: [{}] {}",
                &todo.id.to_string()[..8],
                todo.title
            );
        }
        TodoAction::Delete { id } => {
            client
                .delete(format!("{}/{}", url, id))
                .bearer_auth(token)
                .send()
                .await?
                .error_for_status()?;
            println!("Deleted todo: {}", id);
        }
        TodoAction::ClearColumn { status } => {
            client
                .delete(format!("{}/column/{}", url, status))
                .bearer_auth(token)
                .send()
                .await?
                .error_for_status()?;
            println!("Cleared column: {}", status);
        }
    }

    Ok(())
}

async fn handle_columns(
    client: &Client,
    base_url: &str,
    token: &str,
    action: ColumnAction,
) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/columns", base_url);

    match action {
        ColumnAction::Show => {
            let settings: ColumnSettingsResponse = client
                .get(&url)
                .bearer_auth(token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            print_board(&settings);
        }
        ColumnAction::Reset => {
            let settings: ColumnSettingsResponse = client
                .post(format!("{}/reset", url))
                .bearer_auth(token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!("Column layout reset to defaults.");
            print_board(&settings);
        }
    }

    Ok(())
}

fn print_board(settings: &ColumnSettingsResponse) {
    for column_id in &settings.column_order {
        match settings.columns_config.get(column_id) {
            Some(column) => {
                println!(
                    "{} ({} todo{})",
                    column.title,
                    column.task_ids.len(),
                    if column.task_ids.len() == 1 { "" } else { "s" }
                );
                for task_id in &column.task_ids {
                    println!("    [{}]", &task_id.to_string()[..8]);
                }
            }
            None => println!("{} (missing config)", column_id),
        }
    }
}
