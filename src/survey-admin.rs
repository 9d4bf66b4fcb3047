//! A small admin tool for assigning vendor surveys and checking on them
//! from the command line. Talks to the same REST backend as the service.

use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use vendor_rating::{
    assign::{assign, share_links, AssignmentDraft, AssignmentOutcome},
    backend::{HttpBackend, SurveyBackend},
    error::Error,
};

const PROGRAM_NAME: &str = "survey-admin";

const ABOUT_TEXT: &str = "Assign vendor surveys to raters and list their progress.

EXIT CODES:
     0: Success.
     2: Assignment skipped, nothing was created.
 Other: Error.";

const BACKEND_URL: &str = "BACKEND_URL";
const PUBLIC_URL: &str = "PUBLIC_URL";
const VENDOR: &str = "VENDOR";
const RATER: &str = "RATER";
const INVITED_BY: &str = "INVITED_BY";
const DAYS: &str = "DAYS";
const DEDUPE: &str = "DEDUPE";

const ASSIGN: &str = "assign";
const PENDING: &str = "pending";
const COMPLETED: &str = "completed";

const EXIT_SKIPPED: u8 = 2;

fn public_url_arg() -> Arg {
    Arg::new(PUBLIC_URL)
        .long("public-url")
        .help("Base URL that share links point at")
        .action(ArgAction::Set)
        .default_value("http://localhost:8000")
}

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .arg(
            Arg::new(BACKEND_URL)
                .long("backend-url")
                .help("Base URL of the REST backend")
                .action(ArgAction::Set)
                .default_value("http://localhost:5200/api")
                .global(true),
        )
        .subcommand(
            Command::new(ASSIGN)
                .about("Assign a vendor's survey to one or more raters")
                .arg(
                    Arg::new(VENDOR)
                        .long("vendor")
                        .help("ID of the vendor to rate")
                        .value_parser(value_parser!(i64))
                        .required(true),
                )
                .arg(
                    Arg::new(RATER)
                        .long("rater")
                        .help("ID of a rater; repeat for several")
                        .value_parser(value_parser!(i64))
                        .action(ArgAction::Append)
                        .required(true),
                )
                .arg(
                    Arg::new(INVITED_BY)
                        .long("invited-by")
                        .help("ID of the admin making the assignment")
                        .value_parser(value_parser!(i64))
                        .required(true),
                )
                .arg(
                    Arg::new(DAYS)
                        .long("days")
                        .help("How many days the links stay valid")
                        .value_parser(value_parser!(u32))
                        .default_value("7"),
                )
                .arg(
                    Arg::new(DEDUPE)
                        .long("dedupe")
                        .help("Skip raters who already have a pending survey for the vendor")
                        .action(ArgAction::SetTrue),
                )
                .arg(public_url_arg()),
        )
        .subcommand(
            Command::new(PENDING)
                .about("List surveys still waiting for their rater")
                .arg(public_url_arg()),
        )
        .subcommand(Command::new(COMPLETED).about("List completed surveys by department"))
}

/// Read the assignment draft out of the `assign` arguments.
fn draft(args: &ArgMatches) -> (AssignmentDraft, bool, &str) {
    // Required and defaulted arguments are guaranteed to be present.
    let draft = AssignmentDraft {
        vendor_id: args.get_one::<i64>(VENDOR).copied(),
        rater_user_ids: args
            .get_many::<i64>(RATER)
            .map(|ids| ids.copied().collect())
            .unwrap_or_default(),
        invited_by_user_id: args.get_one::<i64>(INVITED_BY).copied().unwrap_or_default(),
        valid_days: args.get_one::<u32>(DAYS).copied().unwrap_or_default(),
    };
    let public_url = args
        .get_one::<String>(PUBLIC_URL)
        .map(String::as_str)
        .unwrap_or_default();
    (draft, args.get_flag(DEDUPE), public_url)
}

/// The backend URL, wherever on the command line it was given.
fn backend_url(args: &ArgMatches) -> &str {
    args.subcommand()
        .and_then(|(_, sub)| sub.get_one::<String>(BACKEND_URL))
        .or_else(|| args.get_one::<String>(BACKEND_URL))
        .map(String::as_str)
        .unwrap_or_default()
}

/// Print a backend error and pick the exit code for it.
fn report(err: Error) -> u8 {
    match err {
        Error::Network(e) => println!("Could not reach the backend: {e}"),
        err => println!("{err}"),
    }
    1
}

/// Run the subcommand, report the result, and return the exit code.
async fn run(args: &ArgMatches, backend: &dyn SurveyBackend) -> u8 {
    match args.subcommand() {
        Some((ASSIGN, sub)) => {
            let (draft, dedupe, public_url) = draft(sub);
            match assign(backend, &draft, dedupe, public_url).await {
                Ok(AssignmentOutcome::Skipped { reason }) => {
                    println!("Nothing assigned: {reason}");
                    EXIT_SKIPPED
                }
                Ok(AssignmentOutcome::Assigned {
                    links,
                    already_pending,
                    ..
                }) => {
                    for id in already_pending {
                        println!("Rater {id} already has a pending survey, skipped.");
                    }
                    println!(
                        "Created {} survey{}:",
                        links.len(),
                        if links.len() != 1 { "s" } else { "" }
                    );
                    for link in links {
                        println!("{}", link.url);
                    }
                    0
                }
                Err(err) => report(err),
            }
        }
        Some((PENDING, sub)) => match backend.pending_surveys().await {
            Ok(pending) => {
                let public_url = sub
                    .get_one::<String>(PUBLIC_URL)
                    .map(String::as_str)
                    .unwrap_or_default();
                let links = share_links(public_url, &pending);
                for (survey, link) in pending.iter().zip(links) {
                    println!(
                        "{} rates {} until {}: {}",
                        survey.rater_name,
                        survey.vendor_name,
                        survey.valid_until.format("%Y-%m-%d %H:%M"),
                        link.url
                    );
                }
                0
            }
            Err(err) => report(err),
        },
        Some((COMPLETED, _)) => match backend.responses_by_department().await {
            Ok(departments) => {
                for department in departments {
                    println!("{}:", department.department_name);
                    for survey in department.surveys {
                        println!(
                            "  {} rated {} on {}",
                            survey.rater_name,
                            survey.vendor_name,
                            survey.submitted_at.format("%Y-%m-%d")
                        );
                    }
                }
                0
            }
            Err(err) => report(err),
        },
        _ => 1,
    }
}

fn main() {
    let args = cli().get_matches();
    let backend_url = backend_url(&args);
    let exit_code = match HttpBackend::new(backend_url, Duration::from_secs(10)) {
        Ok(backend) => match rocket::tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime.block_on(run(&args, &backend)),
            Err(e) => {
                println!("Could not start the async runtime: {e}");
                1
            }
        },
        Err(err) => report(err),
    };
    std::process::exit(exit_code.into())
}
