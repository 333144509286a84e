use std::io::{self, Write};

use diesel::{prelude::*, sqlite::SqliteConnection};
use dotenvy::dotenv;
use regex::Regex;
use rpassword::read_password;
use vacation_api::orm::employee::{get_employee, get_employee_by_username};
use vacation_api::orm::offline::run_offline_migrations;
use vacation_api::orm::set_foreign_keys;

pub fn establish_connection() -> Result<SqliteConnection, Box<dyn std::error::Error>> {
    dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let mut conn = SqliteConnection::establish(&database_url)?;
    set_foreign_keys(&mut conn)?;
    Ok(conn)
}

pub fn establish_offline_connection() -> Result<SqliteConnection, Box<dyn std::error::Error>> {
    dotenv().ok();
    let database_url = std::env::var("OFFLINE_DATABASE_URL")
        .map_err(|_| "OFFLINE_DATABASE_URL must be set")?;
    let mut conn = SqliteConnection::establish(&database_url)?;
    run_offline_migrations(&mut conn).map_err(|e| e.to_string())?;
    Ok(conn)
}

/// Name recorded in notifications for changes made from the command line.
pub fn acting_admin_name() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "admin".to_string());
    format!("{} (CLI)", user)
}

/// Resolve an employee identifier (either ID or username) to an employee ID.
/// If the input is a valid number, treat it as an ID and verify it exists.
/// Otherwise look it up as a username.
pub fn resolve_employee_id(
    conn: &mut SqliteConnection,
    identifier: &str,
) -> Result<i32, Box<dyn std::error::Error>> {
    if let Ok(id) = identifier.parse::<i32>() {
        match get_employee(conn, id)? {
            Some(_) => Ok(id),
            None => Err(format!("Employee with ID {} does not exist", id).into()),
        }
    } else {
        match get_employee_by_username(conn, identifier)? {
            Some(employee) => Ok(employee.id),
            None => Err(format!("Employee with username '{}' does not exist", identifier).into()),
        }
    }
}

/// Search term given on the command line, regex unless `-F` was passed.
pub enum SearchPattern {
    Fixed(String),
    Regex(Regex),
}

impl SearchPattern {
    pub fn new(term: &str, fixed_string: bool) -> Result<Self, Box<dyn std::error::Error>> {
        if fixed_string {
            Ok(SearchPattern::Fixed(term.to_string()))
        } else {
            let regex = Regex::new(term)
                .map_err(|e| format!("Invalid regex pattern '{}': {}", term, e))?;
            Ok(SearchPattern::Regex(regex))
        }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match self {
            SearchPattern::Fixed(term) => haystack.contains(term.as_str()),
            SearchPattern::Regex(regex) => regex.is_match(haystack),
        }
    }
}

/// Asks a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

pub fn prompt_for_password() -> Result<String, Box<dyn std::error::Error>> {
    print!("Enter new password: ");
    io::stdout().flush()?;
    let password = read_password()?;

    if password.is_empty() {
        return Err("Password cannot be empty".into());
    }

    print!("Confirm new password: ");
    io::stdout().flush()?;
    let confirm_password = read_password()?;

    if password != confirm_password {
        return Err("Passwords do not match".into());
    }

    Ok(password)
}

/// Single password prompt without confirmation, for logging in.
pub fn prompt_for_login_password() -> Result<String, Box<dyn std::error::Error>> {
    print!("Password: ");
    io::stdout().flush()?;
    Ok(read_password()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vacation_api::orm::testing::{insert_test_employee, setup_test_db};

    #[test]
    fn test_search_pattern() {
        let regex = SearchPattern::new("^al", false).unwrap();
        assert!(regex.is_match("alice"));
        assert!(!regex.is_match("sally"));

        let fixed = SearchPattern::new("a.c", true).unwrap();
        assert!(fixed.is_match("xa.cx"));
        assert!(!fixed.is_match("abc"));

        assert!(SearchPattern::new("(", false).is_err());
    }

    #[test]
    fn test_resolve_employee_id() {
        let mut conn = setup_test_db();
        let alice = insert_test_employee(&mut conn, "Alice Smith", "alice", "user");

        assert_eq!(resolve_employee_id(&mut conn, "alice").unwrap(), alice.id);
        assert_eq!(resolve_employee_id(&mut conn, &alice.id.to_string()).unwrap(), alice.id);
        assert!(resolve_employee_id(&mut conn, "nobody").is_err());
        assert!(resolve_employee_id(&mut conn, "9999").is_err());
    }
}
