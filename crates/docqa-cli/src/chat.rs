//! Interactive question/answer session over stdin.
//!
//! Every line is a question unless it starts with `:`. The session owns its store;
//! nothing is shared between sessions.

use std::path::PathBuf;

use anyhow::Result;
use docqa_core::{ChunkConfig, SearchHit};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::output;
use crate::DynStore;

const HELP: &str = "\
Ask a question, or use a command:
  :load <path>...   clear the index, then index these files or directories
  :add <path>...    index more files or directories (keeps what is loaded)
  :clear            drop every indexed chunk
  :history          show this conversation
  :help             show this help
  :quit             exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    User,
    Assistant,
}

struct Message {
    role: Role,
    content: String,
    context: Vec<SearchHit>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ask(String),
    Load(Vec<PathBuf>),
    Add(Vec<PathBuf>),
    Clear,
    History,
    Help,
    Quit,
    Unknown(String),
    Blank,
}

fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Blank;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Ask(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let paths: Vec<PathBuf> = parts.map(PathBuf::from).collect();
    match name {
        "load" => Command::Load(paths),
        "add" => Command::Add(paths),
        "clear" => Command::Clear,
        "history" => Command::History,
        "help" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

fn report_err(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("warning: {e:#}");
    }
}

pub struct Session {
    store: DynStore,
    chunking: ChunkConfig,
    top_k: usize,
    history: Vec<Message>,
}

impl Session {
    pub fn new(store: DynStore, chunking: ChunkConfig, top_k: usize) -> Self {
        Self {
            store,
            chunking,
            top_k,
            history: Vec::new(),
        }
    }

    /// Replace whatever is indexed with `paths`.
    pub async fn load(&mut self, paths: &[PathBuf]) -> Result<()> {
        self.store.clear();
        self.add(paths).await
    }

    pub async fn add(&mut self, paths: &[PathBuf]) -> Result<()> {
        let report = crate::ingest(&mut self.store, paths, &self.chunking).await?;
        output::print_report(&report);
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("{HELP}\n");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match parse_line(&line) {
                Command::Blank => {}
                Command::Ask(question) => self.ask(&question).await,
                Command::Load(paths) | Command::Add(paths) if paths.is_empty() => {
                    println!("usage: :load <path>... or :add <path>...");
                }
                Command::Load(paths) => report_err(self.load(&paths).await),
                Command::Add(paths) => report_err(self.add(&paths).await),
                Command::Clear => {
                    self.store.clear();
                    println!("Index cleared.");
                }
                Command::History => self.print_history(),
                Command::Help => println!("{HELP}"),
                Command::Quit => break,
                Command::Unknown(name) => println!("unknown command :{name} (try :help)"),
            }
        }
        Ok(())
    }

    async fn ask(&mut self, question: &str) {
        self.history.push(Message {
            role: Role::User,
            content: question.to_string(),
            context: Vec::new(),
        });
        let hits = match self.store.search(question, self.top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                eprintln!("warning: search failed: {e}");
                Vec::new()
            }
        };
        let answer = output::format_answer(&hits);
        println!("{answer}");
        if !hits.is_empty() {
            println!("\nRetrieved context:{}", output::format_context(&hits));
        }
        self.history.push(Message {
            role: Role::Assistant,
            content: answer,
            context: hits,
        });
    }

    fn print_history(&self) {
        for message in &self.history {
            let who = match message.role {
                Role::User => "you",
                Role::Assistant => "docqa",
            };
            println!("[{who}] {}", message.content);
            if !message.context.is_empty() {
                println!("  ({} passages retrieved)", message.context.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use docqa_core::{Embedder, HashEmbedder, Store};

    use super::*;

    #[test]
    fn parses_commands_and_questions() {
        assert_eq!(parse_line("  "), Command::Blank);
        assert_eq!(parse_line("what is jupiter?"), Command::Ask("what is jupiter?".into()));
        assert_eq!(
            parse_line(":add a.txt docs"),
            Command::Add(vec![PathBuf::from("a.txt"), PathBuf::from("docs")])
        );
        assert_eq!(parse_line(":load"), Command::Load(Vec::new()));
        assert_eq!(parse_line(":clear"), Command::Clear);
        assert_eq!(parse_line(":q"), Command::Quit);
        assert_eq!(parse_line(":frob"), Command::Unknown("frob".into()));
    }

    #[tokio::test]
    async fn ask_records_history() {
        let embedder: Box<dyn Embedder> = Box::new(HashEmbedder::new(64).unwrap());
        let mut store = Store::new(embedder);
        store
            .add_chunks(&["jupiter is the largest planet".to_string()])
            .await
            .unwrap();
        let mut session = Session::new(store, ChunkConfig::default(), 3);

        session.ask("largest planet").await;
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[1].role, Role::Assistant);
        assert_eq!(session.history[1].context.len(), 1);

        session.store.clear();
        session.ask("largest planet").await;
        assert_eq!(session.history[3].content, output::NO_CONTEXT);
        assert!(session.history[3].context.is_empty());
    }
}
