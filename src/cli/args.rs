use clap::{ArgAction, Args, Parser, Subcommand};

use crate::model::DraftPatch;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bookshelf",
    version,
    about = "manage a personal book catalog over REST",
    long_about = "Bookshelf lists, searches, adds, edits and deletes book records held by a REST backend.\n\nExamples:\n  bookshelf list --search dune --sort title\n  bookshelf list --genre SciFi --format html --page -o books.html\n  bookshelf add --title Emma --author Austen --genre Romance --year 1815\n  bookshelf edit 2 --notes \"first edition\"\n  bookshelf delete 2\n\nTip: Use --config (or ~/.bookshelf/config.yml) to persist the backend url."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "config",
        global = true,
        value_name = "FILE",
        help_heading = "Backend",
        help = "Path to config file (defaults to ~/.bookshelf/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'b',
        long = "base-url",
        global = true,
        value_name = "URL",
        help_heading = "Backend",
        help = "Base url of the catalog backend."
    )]
    pub base_url: Option<String>,

    #[arg(
        long = "timeout",
        global = true,
        value_name = "SECONDS",
        help_heading = "Backend",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch the catalog and print it filtered and sorted.
    List(ListArgs),

    /// Print the genre options offered by the category filter.
    Genres,

    /// Print a single record.
    Show {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(long = "json", help = "Print the raw record as JSON.")]
        json: bool,
    },

    /// Create a record, then print the refreshed catalog.
    Add(AddArgs),

    /// Load a record into the form, apply changes and commit them.
    Edit(EditArgs),

    /// Delete a record after confirmation.
    Delete {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(short = 'y', long = "yes", help = "Do not ask for confirmation.")]
        yes: bool,
    },

    /// Save the backend's database snapshot.
    Download {
        #[arg(
            short = 'o',
            long = "output",
            value_name = "PATH",
            help = "File or directory to write to (defaults to ./library.db)."
        )]
        output: Option<String>,
    },

    /// Write a commented default config file.
    InitConfig {
        #[arg(value_name = "PATH")]
        path: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(
        short = 's',
        long = "search",
        value_name = "TEXT",
        help = "Keep records whose title or author contains TEXT (case-insensitive)."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'g',
        long = "genre",
        visible_alias = "category",
        value_name = "GENRE",
        help = "Keep records of this genre (case-insensitive)."
    )]
    pub genre: Option<String>,

    #[arg(
        long = "sort",
        value_name = "KEY",
        help = "Sort by title, author or published_year."
    )]
    pub sort: Option<String>,

    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        help = "Output format: text, json or html."
    )]
    pub format: Option<String>,

    #[arg(long = "page", help = "With html output, render a full standalone page.")]
    pub page: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Write to FILE instead of stdout (format inferred from extension)."
    )]
    pub output: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BookFields {
    #[arg(long = "genre", value_name = "GENRE")]
    pub genre: Option<String>,

    #[arg(long = "year", visible_alias = "published-year", value_name = "YEAR")]
    pub year: Option<String>,

    #[arg(long = "location", value_name = "TEXT")]
    pub location: Option<String>,

    #[arg(long = "kstatus", value_name = "TEXT")]
    pub kstatus: Option<String>,

    #[arg(long = "krates", value_name = "TEXT")]
    pub krates: Option<String>,

    #[arg(long = "jstatus", value_name = "TEXT")]
    pub jstatus: Option<String>,

    #[arg(long = "jrates", value_name = "TEXT")]
    pub jrates: Option<String>,

    #[arg(long = "notes", value_name = "TEXT")]
    pub notes: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long = "title", value_name = "TITLE")]
    pub title: String,

    #[arg(long = "author", value_name = "AUTHOR")]
    pub author: String,

    #[command(flatten)]
    pub fields: BookFields,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long = "title", value_name = "TITLE")]
    pub title: Option<String>,

    #[arg(long = "author", value_name = "AUTHOR")]
    pub author: Option<String>,

    #[command(flatten)]
    pub fields: BookFields,

    #[arg(
        long = "dry-run",
        help = "Print the record as loaded into the form and stop without committing."
    )]
    pub dry_run: bool,
}

impl BookFields {
    fn into_patch(self, title: Option<String>, author: Option<String>) -> DraftPatch {
        DraftPatch {
            title,
            author,
            genre: self.genre,
            published_year: self.year,
            location: self.location,
            kstatus: self.kstatus,
            krates: self.krates,
            jstatus: self.jstatus,
            jrates: self.jrates,
            notes: self.notes,
        }
    }
}

impl AddArgs {
    pub fn into_patch(self) -> DraftPatch {
        self.fields.into_patch(Some(self.title), Some(self.author))
    }
}

impl EditArgs {
    pub fn patch(&self) -> DraftPatch {
        self.fields
            .clone()
            .into_patch(self.title.clone(), self.author.clone())
    }
}
