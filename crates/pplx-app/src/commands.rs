//! Subcommand handlers.

use pplx_client::ChatService;
use pplx_common::{ChatError, Conversation, Event};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{info, warn};

use crate::cli::Command;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn run(service: &ChatService, command: Command) -> Result<(), AppError> {
    match command {
        Command::Chat { conversation } => {
            connect(service).await?;
            chat(service, conversation).await
        }
        Command::Ask { text, conversation } => {
            connect(service).await?;
            let conversation_id = ask(service, &text, conversation.as_deref()).await?;
            info!(conversation_id = %conversation_id, "answer complete");
            Ok(())
        }
        Command::List => {
            for conversation in service.get_conversations().await {
                println!("{}", summary_line(&conversation));
            }
            Ok(())
        }
        Command::Show { id } => {
            let conversation = service.get_conversation(&id).await?;
            print!("{}", transcript(&conversation));
            Ok(())
        }
        Command::Delete { id } => {
            service.delete_conversation(&id).await;
            Ok(())
        }
        Command::Clear => {
            service.clear_conversations().await;
            Ok(())
        }
        Command::Login => {
            service.initialize().await?;
            if !service.login().await {
                return Err(AppError::AuthenticationFailed);
            }
            println!("authenticated");
            Ok(())
        }
        Command::Logout => {
            service.logout().await;
            println!("logged out");
            Ok(())
        }
    }
}

async fn connect(service: &ChatService) -> Result<(), AppError> {
    service.initialize().await?;
    if !service.authenticate().await {
        return Err(AppError::AuthenticationFailed);
    }
    Ok(())
}

/// Read questions from stdin until EOF or `/quit`. `/new` starts a fresh
/// conversation.
async fn chat(service: &ChatService, conversation: Option<String>) -> Result<(), AppError> {
    let mut conversation_id = match conversation {
        Some(id) => Some(service.get_conversation(&id).await?.id),
        None => None,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                conversation_id = None;
                continue;
            }
            _ => {}
        }

        // Created up front so a failed first exchange still has a home.
        let id = match &conversation_id {
            Some(id) => id.clone(),
            None => service.create_conversation(None).await.id,
        };
        conversation_id = Some(id.clone());

        if let Err(e) = ask(service, line, Some(&id)).await {
            eprintln!("error: {e}");
        }
    }
    Ok(())
}

/// Send one question, echoing tokens to stdout as they arrive. Ctrl-C
/// cancels the exchange. Returns the conversation id.
async fn ask(
    service: &ChatService,
    text: &str,
    conversation: Option<&str>,
) -> Result<String, AppError> {
    let mut events = service.subscribe();
    let mut stdout = tokio::io::stdout();
    let mut echo = TokenEcho::default();

    let send = service.send_message(text, conversation);
    tokio::pin!(send);

    let result = loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => write_out(&mut stdout, echo.on_event(event)).await?,
                Err(RecvError::Lagged(skipped)) => echo.on_lag(skipped),
                Err(RecvError::Closed) => {}
            },
            result = &mut send => break result,
            _ = tokio::signal::ctrl_c() => service.cancel(),
        }
    };

    loop {
        match events.try_recv() {
            Ok(event) => write_out(&mut stdout, echo.on_event(event)).await?,
            Err(TryRecvError::Lagged(skipped)) => echo.on_lag(skipped),
            Err(_) => break,
        }
    }

    let receipt = result?;
    if echo.is_lagged() {
        let conversation = service.get_conversation(&receipt.conversation_id).await?;
        if let Some(reply) = conversation
            .messages
            .iter()
            .find(|m| m.id == receipt.message_id)
        {
            write_out(&mut stdout, Some(echo.remainder(&reply.content))).await?;
        }
    }
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;

    Ok(receipt.conversation_id)
}

async fn write_out(stdout: &mut tokio::io::Stdout, text: Option<String>) -> std::io::Result<()> {
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Terminal echo of a streamed answer.
///
/// Output is always a prefix of the final answer: once the event stream
/// reports a gap, echoing stops and `remainder` later supplies the rest
/// from the committed message.
#[derive(Default)]
struct TokenEcho {
    shown_chars: usize,
    lagged: bool,
}

impl TokenEcho {
    /// Text to print for `event`, if any.
    fn on_event(&mut self, event: Event) -> Option<String> {
        match event {
            Event::TokenReceived { token, .. } if !self.lagged => {
                self.shown_chars += token.chars().count();
                Some(token)
            }
            _ => None,
        }
    }

    fn on_lag(&mut self, skipped: u64) {
        warn!(skipped, "token output lagged, answer will be completed from storage");
        self.lagged = true;
    }

    fn is_lagged(&self) -> bool {
        self.lagged
    }

    /// The part of `answer` not yet printed.
    fn remainder(&self, answer: &str) -> String {
        answer.chars().skip(self.shown_chars).collect()
    }
}

fn summary_line(conversation: &Conversation) -> String {
    format!(
        "{}  {}  ({} messages, updated {})",
        conversation.id,
        conversation.title,
        conversation.message_count(),
        conversation.updated_at.format("%Y-%m-%d %H:%M"),
    )
}

fn transcript(conversation: &Conversation) -> String {
    let mut out = format!("# {}\n", conversation.title);
    for message in &conversation.messages {
        let speaker = if message.is_user { "you" } else { "pplx" };
        out.push_str(&format!("\n{speaker}: {}\n", message.content));
    }
    out
}
