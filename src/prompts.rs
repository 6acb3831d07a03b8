use std::io::{self, BufRead, Write};

/// Dialogs the commands need from the host shell
pub trait Prompter {
    /// Free-text question; `None` when the user cancels
    fn prompt(&self, title: &str, message: &str) -> Option<String>;

    fn confirm(&self, title: &str, message: &str) -> bool;

    fn alert(&self, title: &str, message: &str);
}

/// Terminal dialogs on stdin/stdout. End of input cancels.
pub struct ConsolePrompter;

impl ConsolePrompter {
    fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl Prompter for ConsolePrompter {
    fn prompt(&self, title: &str, message: &str) -> Option<String> {
        println!("\n📝 {}", title);
        print!("   {} ", message);
        let _ = io::stdout().flush();
        self.read_line()
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        println!("\n❓ {}", title);
        print!("   {} [y/N] ", message);
        let _ = io::stdout().flush();
        matches!(
            self.read_line().map(|s| s.trim().to_lowercase()).as_deref(),
            Some("y") | Some("yes")
        )
    }

    fn alert(&self, title: &str, message: &str) {
        println!("\n📣 {}", title);
        for line in message.lines() {
            println!("   {}", line);
        }
    }
}
