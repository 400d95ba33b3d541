use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use filingscope::filters::{FilingFilter, PageRequest};

#[derive(Parser)]
#[command(name = "filingscope")]
#[command(about = "Resolve companies to SEC registry IDs and browse or mine their EDGAR filings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a ticker, company name or CIK
    Resolve {
        /// Ticker, company name or CIK
        query: String,
    },

    /// List an entity's filings, newest first
    Filings {
        /// Ticker, company name or CIK
        identifier: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Fetch each listed filing and extract signals
        #[arg(long)]
        enrich: bool,
    },

    /// Find filings that mention a person
    Person {
        /// Ticker, company name or CIK
        identifier: String,

        /// Person name, e.g. "Jane Public"
        name: String,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub from_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub to_date: Option<NaiveDate>,

    /// Form type or family (8-K, 4, OWNERSHIP, OFFERING...); repeatable
    #[arg(short, long = "form")]
    pub forms: Vec<String>,

    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Filings per page
    #[arg(long, default_value = "20")]
    pub page_size: usize,
}

impl FilterArgs {
    pub fn filter(&self) -> FilingFilter {
        FilingFilter {
            date_from: self.from_date,
            date_to: self.to_date,
            form_types: self.forms.clone(),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}
