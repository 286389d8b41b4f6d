#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # examgrader
//! ## Introduction
//!
//! Grades photographed exams against an answer key using Gemini.
//!
//! 1. `examgrader setup --api-key <KEY>` once.
//! 2. `examgrader extract answers.pdf --save` to pull the answer key out of a
//!    PDF. Edit it with `examgrader setup --answer-key-file <FILE>` if needed.
//! 3. `examgrader grade page1.jpg page2.jpg` for every student.
//!
//! Add `--sheet-title <TAB>` to log each result to the spreadsheet saved with
//! `setup --sheet <LINK> --google-token <TOKEN>`.

use anyhow::{Context, Result};
use bpaf::*;
use chrono::Local;
use dotenvy::dotenv;
use examgrader::{
    ScorePolicy, Session, SheetsError,
    sheets::{SheetsClient, Worksheet, extract_spreadsheet_id},
    storage::SettingsStore,
};
use tabled::{Table, settings::Style};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Values accepted by `setup`.
#[derive(Debug, Clone)]
struct SetupArgs {
    /// Gemini API key
    api_key:         Option<String>,
    /// Spreadsheet link
    sheet:           Option<String>,
    /// Google OAuth client id
    client_id:       Option<String>,
    /// Google OAuth access token
    google_token:    Option<String>,
    /// Lifetime of `google_token`, in seconds
    expires_in:      i64,
    /// File whose contents replace the stored answer key
    answer_key_file: Option<String>,
    /// Forget the Google token
    logout:          bool,
}

/// Values accepted by `grade`.
#[derive(Debug, Clone)]
struct GradeArgs {
    /// File holding the answer key; the stored key is used when absent
    answer_key:  Option<String>,
    /// Spreadsheet tab to append the result to
    sheet_title: Option<String>,
    /// Clamp scores into [0, 100]
    clamp:       bool,
    /// Print JSON instead of a table
    json:        bool,
    /// Exam page images
    pages:       Vec<String>,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Store credentials and preferences
    Setup(SetupArgs),
    /// Extract an answer key from a PDF
    Extract(String, bool),
    /// Grade one student's exam
    Grade(GradeArgs),
    /// List the tabs of the configured spreadsheet
    Worksheets,
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    let setup = {
        let api_key = long("api-key")
            .help("Gemini API key")
            .argument::<String>("KEY")
            .optional();
        let sheet = long("sheet")
            .help("Link to the Google Sheet that collects results")
            .argument::<String>("URL")
            .optional();
        let client_id = long("client-id")
            .help("Google OAuth client id")
            .argument::<String>("ID")
            .optional();
        let google_token = long("google-token")
            .help("Google OAuth access token with the spreadsheets scope")
            .argument::<String>("TOKEN")
            .optional();
        let expires_in = long("expires-in")
            .help("Lifetime of the access token in seconds")
            .argument::<i64>("SECS")
            .guard(|secs| *secs > 0, "--expires-in must be a positive number of seconds")
            .fallback(3600);
        let answer_key_file = long("answer-key-file")
            .help("Replace the stored answer key with the contents of FILE")
            .argument::<String>("FILE")
            .optional();
        let logout = long("logout").help("Forget the Google access token").switch();

        construct!(SetupArgs {
            api_key,
            sheet,
            client_id,
            google_token,
            expires_in,
            answer_key_file,
            logout
        })
        .to_options()
        .command("setup")
        .help("Store credentials and preferences; prints the current state")
        .map(Cmd::Setup)
    };

    let extract = {
        let pdf = positional::<String>("PDF").help("PDF containing the answer key");
        let save = long("save")
            .help("Store the extracted key for later `grade` runs")
            .switch();

        construct!(Cmd::Extract(pdf, save))
            .to_options()
            .command("extract")
            .help("Extract the answer key from a PDF")
    };

    let grade = {
        let answer_key = long("answer-key")
            .help("File holding the answer key (defaults to the stored one)")
            .argument::<String>("FILE")
            .optional();
        let sheet_title = long("sheet-title")
            .help("Append the result to this tab of the configured spreadsheet")
            .argument::<String>("TAB")
            .optional();
        let clamp = long("clamp")
            .help("Clamp the score into the range 0-100")
            .switch();
        let json = long("json").help("Print the result as JSON").switch();
        let pages = positional::<String>("PAGE")
            .help("Photo of an exam page, in page order")
            .some("At least one exam page is required");

        construct!(GradeArgs {
            answer_key,
            sheet_title,
            clamp,
            json,
            pages
        })
        .to_options()
        .command("grade")
        .help("Grade one student's exam")
        .map(Cmd::Grade)
    };

    let worksheets = pure(Cmd::Worksheets)
        .to_options()
        .command("worksheets")
        .help("List the tabs of the configured spreadsheet");

    let cmd = construct!([setup, extract, grade, worksheets]);

    cmd.to_options()
        .descr("Grades photographed exams against an answer key")
        .run()
}

/// Masks all but the last four characters of a secret.
fn mask(secret: &str) -> String {
    let shown: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{shown}")
}

/// Applies `setup` flags and prints what is stored.
fn setup(args: SetupArgs) -> Result<()> {
    let mut store = SettingsStore::open_default()?;

    if let Some(key) = args.api_key {
        store.set_gemini_api_key(key.trim());
    }
    if let Some(link) = args.sheet {
        if extract_spreadsheet_id(&link).is_none() {
            return Err(SheetsError::InvalidLink(link).into());
        }
        store.set_google_sheet_link(link.trim());
    }
    if let Some(client_id) = args.client_id {
        store.set_google_client_id(client_id.trim());
    }
    if let Some(path) = args.answer_key_file {
        let key = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read answer key from {path}"))?;
        store.set_answer_key(key);
    }
    if args.logout {
        store.remove_google_token();
    }
    if let Some(token) = args.google_token {
        store.set_google_token(token.trim(), args.expires_in);
    }

    let has_token = store.google_token().is_some();
    store.save()?;

    println!("Settings file:   {}", store.path().display());
    println!("Gemini API key:  {}", store.gemini_api_key().map(mask).unwrap_or("-".into()));
    println!("Sheet link:      {}", store.google_sheet_link().unwrap_or("-"));
    println!("OAuth client id: {}", store.google_client_id().unwrap_or("-"));
    println!("Google token:    {}", if has_token { "valid" } else { "-" });
    println!(
        "Answer key:      {}",
        store
            .answer_key()
            .map(|k| format!("{} characters", k.chars().count()))
            .unwrap_or("-".into())
    );
    Ok(())
}

/// Resolves the stored spreadsheet id and an authenticated Sheets client.
fn spreadsheet(http: reqwest::Client, store: &mut SettingsStore) -> Result<(String, SheetsClient)> {
    let link = store
        .google_sheet_link()
        .context("No spreadsheet configured. Run `examgrader setup --sheet <LINK>` first.")?
        .to_string();
    let id = extract_spreadsheet_id(&link).ok_or(SheetsError::InvalidLink(link))?;

    let token = store.google_token();
    store.save()?;
    let client = SheetsClient::authenticated(http, token).map_err(|e| match store.google_client_id() {
        Some(client_id) => anyhow::Error::new(e)
            .context(format!("Sign in with OAuth client {client_id} to obtain a token")),
        None => anyhow::Error::new(e),
    })?;
    Ok((id, client))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();

    match cmd {
        Cmd::Setup(args) => setup(args)?,
        Cmd::Extract(pdf, save) => {
            let mut store = SettingsStore::open_default()?;
            let session = Session::from_env_or_store(&store)?;
            let answer_key = session
                .extract_answer_key(&pdf)
                .await
                .with_context(|| format!("Failed to extract the answer key from {pdf}"))?;

            println!("{answer_key}");
            if save {
                store.set_answer_key(answer_key);
                store.save()?;
                tracing::info!("Answer key saved to {}", store.path().display());
            }
        }
        Cmd::Grade(args) => {
            let mut store = SettingsStore::open_default()?;
            let policy = if args.clamp {
                ScorePolicy::Clamp
            } else {
                ScorePolicy::PassThrough
            };
            let session = Session::from_env_or_store(&store)?.with_score_policy(policy);

            let answer_key = match &args.answer_key {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Could not read answer key from {path}"))?,
                None => store
                    .answer_key()
                    .context(
                        "No answer key stored. Run `examgrader extract <PDF> --save` or pass \
                         --answer-key <FILE>.",
                    )?
                    .to_string(),
            };

            let sheet = match &args.sheet_title {
                Some(title) => Some((title, spreadsheet(session.http_client(), &mut store)?)),
                None => None,
            };

            let result = session.grade(&answer_key, &args.pages).await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.render());
            }

            if let Some((title, (id, sheets))) = sheet {
                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                sheets
                    .append_row(&id, title, result.to_row(timestamp))
                    .await
                    .context("Failed to log the result to Google Sheets")?;
            }
        }
        Cmd::Worksheets => {
            let mut store = SettingsStore::open_default()?;
            let (id, sheets) = spreadsheet(reqwest::Client::new(), &mut store)?;
            let worksheets: Vec<Worksheet> = sheets.fetch_worksheets(&id).await?;
            println!("{}", Table::new(&worksheets).with(Style::modern()));
        }
    };

    Ok(())
}
