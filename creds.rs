use std::io::{self, IsTerminal, Write};

/// What the user types during setup.
#[derive(Clone)]
pub struct AccountLogin {
    pub email: String,
    pub password: String,
    pub twofa: String,
}

impl std::fmt::Debug for AccountLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLogin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Ask for the account login on the terminal. The prompt blocks, so it runs
/// off the async workers. `None` means cancelled or no terminal.
pub async fn get_credentials() -> Option<AccountLogin> {
    tokio::task::spawn_blocking(prompt_terminal)
        .await
        .ok()
        .flatten()
}

fn prompt_terminal() -> Option<AccountLogin> {
    if !io::stdin().is_terminal() {
        eprintln!("No terminal available. Run `pushover-sensor setup` in an interactive shell.");
        return None;
    }

    println!("\n=== Pushover Login ===");
    println!("Enter your Pushover account details. A new device will be registered for this sensor.");
    println!("Note: device names must be unique, remove an old device on pushover.net first.\n");

    let email = read_line("Email: ")?;

    print!("Password: ");
    io::stdout().flush().ok()?;
    let password = rpassword::read_password().ok()?;
    let password = non_empty(&password)?;

    let twofa = read_line("Two-factor code: ")?;

    Some(AccountLogin {
        email,
        password,
        twofa,
    })
}

fn read_line(label: &str) -> Option<String> {
    print!("{}", label);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).ok()?;
    non_empty(&input)
}

fn non_empty(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        println!("Login cancelled.");
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_cancels() {
        assert_eq!(non_empty("  \n"), None);
        assert_eq!(non_empty(" 123456\n").as_deref(), Some("123456"));
    }

    #[test]
    fn debug_omits_password() {
        let login = AccountLogin {
            email: "me@example.com".to_string(),
            password: "hunter2".to_string(),
            twofa: "000000".to_string(),
        };
        let printed = format!("{:?}", login);
        assert!(printed.contains("me@example.com"));
        assert!(!printed.contains("hunter2"));
    }
}
