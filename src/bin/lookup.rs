//! Terminal host for the order lookup widget.
//!
//! With an order UID argument, performs one lookup and exits non-zero on
//! failure. Without one, every line typed is the identifier field's content
//! followed by Enter.

use clap::Parser;
use order_lookup::widget::{self, HttpOrderSource, Key, LookupStatus, Page, ResultArea, UiEvent};
use std::io::Write;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lookup", version, about = "Look up orders in the order service")]
struct Args {
    /// Base URL of the order service
    #[arg(long, env = "ORDER_SERVICE_URL", default_value = "http://localhost:8081")]
    base_url: String,

    /// Order UID to look up once; omit for interactive mode
    order_uid: Option<String>,
}

#[derive(Default)]
struct TerminalPage {
    input: Mutex<String>,
}

impl TerminalPage {
    fn type_line(&self, line: &str) {
        *self.input.lock().unwrap_or_else(PoisonError::into_inner) = line.to_string();
    }
}

impl Page for TerminalPage {
    fn identifier(&self) -> String {
        self.input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn render(&self, content: ResultArea) {
        match content {
            ResultArea::Empty => {}
            ResultArea::Error(message) => println!("error: {}", message),
            ResultArea::Json(text) => println!("{}", text),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = match HttpOrderSource::new(&args.base_url) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    let lookup = widget::init(TerminalPage::default(), source);

    if let Some(order_uid) = args.order_uid {
        lookup.page().type_line(&order_uid);
        return match lookup.handle(UiEvent::Activate).await {
            LookupStatus::Rendered(ResultArea::Json(_)) => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        };
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("order uid> ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("failed to read input: {}", e);
                return ExitCode::FAILURE;
            }
        };

        lookup.page().type_line(&line);
        lookup.handle(UiEvent::KeyPress(Key::Enter)).await;
    }

    ExitCode::SUCCESS
}
