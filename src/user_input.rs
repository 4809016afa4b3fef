//! Interactive confirmation prompts for destructive operations.

use std::io::{self, Write};

/// Asks the user to confirm an action, re-asking until the answer is 'y' or
/// 'n'. Returns true on 'y'.
pub fn confirm() -> bool {
    let mut answer = prompt("Confirm? [y/n] ");
    loop {
        match answer.trim() {
            "y" => return true,
            "n" => return false,
            _ => answer = prompt("Invalid response. Please answer 'y' or 'n'. "),
        }
    }
}

fn prompt(message: &str) -> String {
    print!("{}", message);
    io::stdout().flush().expect("Failed to flush stdout");

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .expect("Failed to read input");
    input
}
