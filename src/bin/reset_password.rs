//! An admin tool that resets a user's password from the command line.

use clap::Parser;
use rusqlite::Connection;

use spendlog::{Error, PasswordHash, get_user_by_username, update_password};

/// Reset the password of a spendlog user.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The username of the account to reset.
    #[arg(long)]
    username: String,
}

fn main() {
    let args = Args::parse();

    let conn = Connection::open(&args.db_path).expect("Could not open the database file");

    let user = match get_user_by_username(&args.username, &conn) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            eprintln!("No user named {:?} exists.", args.username);
            std::process::exit(1);
        }
        Err(error) => {
            eprintln!("Could not look up user: {error}");
            std::process::exit(1);
        }
    };

    let password =
        rpassword::prompt_password("New password: ").expect("Could not read the password");
    let confirmation =
        rpassword::prompt_password("Confirm new password: ").expect("Could not read the password");

    if password != confirmation {
        eprintln!("Passwords do not match.");
        std::process::exit(1);
    }

    let password_hash = match PasswordHash::from_raw_password(&password, PasswordHash::DEFAULT_COST)
    {
        Ok(password_hash) => password_hash,
        Err(Error::TooWeak(reason)) => {
            eprintln!("Password is too weak: {reason}");
            std::process::exit(1);
        }
        Err(error) => {
            eprintln!("Could not hash the password: {error}");
            std::process::exit(1);
        }
    };

    update_password(&password_hash, user.id, &conn).expect("Could not update the password");

    println!("Password updated for {}.", user.username);
}
