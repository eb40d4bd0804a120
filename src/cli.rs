//! Terminal front end: a stdin/stdout REPL over the chat, auth, and dashboard.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::app::App;
use crate::chat::{Chatbot, Message, Role, SubmitOutcome};
use crate::error::SessionError;

const HELP: &str = "\
Commands:
  /login <email> <password>           Sign in
  /signup <name> <email> <password>   Create an account (name may contain spaces)
  /google <token>                     Sign in with a Google OAuth token
  /logout                             Sign out
  /whoami                             Show the signed-in user
  /dashboard                          Show (or reload) your progress dashboard
  /health                             Check that the API is reachable
  /help                               Show this help
  /quit                               Exit
Anything else is sent to the question generator.";

const LOGIN_HINT: &str = "Please sign in first: /login <email> <password> (or /signup).";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Signup { name: String, email: String, password: String },
    Google { token: String },
    Logout,
    WhoAmI,
    Dashboard,
    Health,
    Help,
    Quit,
    /// Free text for the chatbot.
    Chat(String),
    /// A slash command with bad arguments; holds the usage line.
    Usage(&'static str),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();

        match lower.as_str() {
            "/logout" => return Command::Logout,
            "/whoami" | "/me" => return Command::WhoAmI,
            "/dashboard" | "/progress" => return Command::Dashboard,
            "/health" => return Command::Health,
            "/help" | "/?" => return Command::Help,
            "/quit" | "/exit" => return Command::Quit,
            _ => {}
        }

        let mut words = trimmed.split_whitespace();
        let head = words.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        match head.as_str() {
            "/login" => match args.as_slice() {
                [email, password] => Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => Command::Usage("/login <email> <password>"),
            },
            "/signup" => match args.as_slice() {
                [name @ .., email, password] if !name.is_empty() => Command::Signup {
                    name: name.join(" "),
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => Command::Usage("/signup <name> <email> <password>"),
            },
            "/google" => match args.as_slice() {
                [token] => Command::Google {
                    token: token.to_string(),
                },
                _ => Command::Usage("/google <token>"),
            },
            _ => Command::Chat(trimmed.to_string()),
        }
    }
}

/// Interactive session state.
pub struct Repl {
    app: App,
    chatbot: Option<Arc<Chatbot>>,
}

impl Repl {
    pub fn new(app: App) -> Self {
        Self { app, chatbot: None }
    }

    /// Read lines until EOF, `/quit`, or Ctrl+C.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        eprintln!("🤖 Math Practice v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("   API: {}", self.app.config.api_url);
        let restored = self.app.session.current_user().await;
        match restored {
            Some(user) => {
                eprintln!("   Signed in as {} <{}>", user.name, user.email);
                self.start_conversation();
            }
            None => eprintln!("   {LOGIN_HINT}"),
        }
        eprintln!("   Type /help for commands.\n");
        prompt();

        loop {
            let line = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down...");
                    break;
                }
                line = rx.recv() => match line {
                    Some(line) => line,
                    None => break,
                },
            };

            if line.trim().is_empty() {
                prompt();
                continue;
            }

            match Command::parse(&line) {
                Command::Quit => break,
                Command::Chat(text) => {
                    if self.chat(&text, &mut rx).await.is_break() {
                        info!("Ctrl+C received during a turn, shutting down...");
                        break;
                    }
                }
                command => self.command(command).await,
            }
            prompt();
        }

        Ok(())
    }

    fn start_conversation(&mut self) {
        let chatbot = Arc::new(self.app.new_chatbot());
        for message in chatbot.messages() {
            print_message(&message);
        }
        self.chatbot = Some(chatbot);
    }

    async fn command(&mut self, command: Command) {
        let session = Arc::clone(&self.app.session);
        match command {
            Command::Login { email, password } => {
                let result = session.login(&email, &password).await;
                self.after_auth(result);
            }
            Command::Signup {
                name,
                email,
                password,
            } => {
                let result = session.signup(&name, &email, &password).await;
                self.after_auth(result);
            }
            Command::Google { token } => {
                let result = session.google_login(&token).await;
                self.after_auth(result);
            }
            Command::Logout => match session.logout().await {
                Ok(()) => {
                    self.chatbot = None;
                    eprintln!("Signed out.");
                }
                Err(e) => eprintln!("error: {e}"),
            },
            Command::WhoAmI => match session.current_user().await {
                Some(user) => eprintln!("{} <{}> (id {})", user.name, user.email, user.id),
                None => eprintln!("Not signed in."),
            },
            Command::Dashboard => {
                if !session.is_authenticated().await {
                    eprintln!("{LOGIN_HINT}");
                    return;
                }
                let mut view = self.app.dashboard();
                eprintln!("Loading your progress data...");
                view.load().await;
                println!("\n{}\n", view.render());
            }
            Command::Health => match self.app.client.health().await {
                Ok(health) => eprintln!("API {}: {}", health.status, health.message),
                Err(e) => eprintln!("error: {e}"),
            },
            Command::Help => eprintln!("{HELP}"),
            Command::Usage(usage) => eprintln!("usage: {usage}"),
            Command::Quit | Command::Chat(_) => {}
        }
    }

    fn after_auth(&mut self, result: Result<crate::session::User, SessionError>) {
        match result {
            Ok(user) => {
                eprintln!("Welcome, {}!", user.name);
                self.start_conversation();
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    /// Run one chat turn. Lines typed while it is in flight are offered to
    /// the chatbot too, which turns them away. Breaks on Ctrl+C.
    async fn chat(
        &mut self,
        text: &str,
        rx: &mut mpsc::UnboundedReceiver<String>,
    ) -> ControlFlow<()> {
        let Some(chatbot) = self.chatbot.clone() else {
            eprintln!("{LOGIN_HINT}");
            return ControlFlow::Continue(());
        };

        eprintln!("Generating your math question... ⚡");
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        match drive_turn(&chatbot, text, rx, shutdown).await {
            Some(SubmitOutcome::Completed { replies }) => {
                for message in &replies {
                    print_message(message);
                }
                ControlFlow::Continue(())
            }
            Some(_) => ControlFlow::Continue(()),
            None => ControlFlow::Break(()),
        }
    }
}

/// Await one turn while turning away extra input. Returns `None` if
/// `shutdown` fires first; the turn is dropped and the chatbot freed.
async fn drive_turn(
    chatbot: &Chatbot,
    text: &str,
    rx: &mut mpsc::UnboundedReceiver<String>,
    shutdown: impl Future<Output = ()>,
) -> Option<SubmitOutcome> {
    let turn = chatbot.submit(text);
    tokio::pin!(turn);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return None,
            outcome = &mut turn => return Some(outcome),
            Some(extra) = rx.recv() => {
                if matches!(chatbot.submit(&extra).await, SubmitOutcome::Busy) {
                    eprintln!("⏳ Still working on your last message; that input was ignored.");
                }
            }
        }
    }
}

fn print_message(message: &Message) {
    match message.role {
        Role::Bot => println!("\n🤖 {}\n", message.text),
        Role::User => println!("> {}", message.text),
    }
}

fn prompt() {
    eprint!("> ");
}
