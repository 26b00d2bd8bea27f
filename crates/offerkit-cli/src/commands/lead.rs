use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use offerkit_core::records::{self, contact_links};
use offerkit_core::{admin, csv, ContactMethod, LeadForm};

use crate::common::{CliResult, Context};

#[derive(Subcommand)]
pub enum LeadAction {
    /// Capture a new lead
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        /// phone, telegram or whatsapp
        #[arg(long, default_value = "whatsapp")]
        contact: ContactMethod,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// List captured leads, oldest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Export leads as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write to `leads-YYYY-MM-DD.csv` in the current directory
        #[arg(long, conflicts_with = "out")]
        dated: bool,
        /// Only print the header and first few rows
        #[arg(long)]
        preview: Option<usize>,
    },
    /// Summary counts for the admin panel
    Stats,
    /// Delete all captured leads
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: LeadAction, ctx: &Context) -> CliResult {
    match action {
        LeadAction::Add {
            name,
            phone,
            email,
            contact,
            note,
        } => {
            let form = LeadForm {
                name,
                phone,
                email,
                preferred_contact: contact,
                note,
            };
            let lead = form.validate(Utc::now())?;
            if !records::submit_lead(&ctx.store, lead.clone()) {
                eprintln!("warning: lead was not persisted");
            }
            let links = contact_links(&ctx.config.contact, &lead.name);
            let json = serde_json::json!({
                "lead": lead,
                "contact_url": links.for_method(lead.preferred_contact),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        LeadAction::List { json } => {
            let leads = records::leads(&ctx.store);
            if json {
                println!("{}", serde_json::to_string_pretty(&leads)?);
            } else if leads.is_empty() {
                println!("No leads yet");
            } else {
                for lead in &leads {
                    println!(
                        "{}  {:<20} {:<18} {:<9} {}",
                        lead.created_at.format("%Y-%m-%d %H:%M"),
                        lead.name,
                        lead.phone,
                        lead.preferred_contact.as_str(),
                        lead.email.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
        LeadAction::Export {
            out,
            dated,
            preview,
        } => {
            let leads = records::leads(&ctx.store);
            if leads.is_empty() {
                return Err("no leads to export".into());
            }
            let content = csv::leads_to_csv(&leads);
            if let Some(rows) = preview {
                println!("{}", csv::preview(&content, rows));
                return Ok(());
            }
            let target = match (out, dated) {
                (Some(path), _) => Some(path),
                (None, true) => Some(PathBuf::from(csv::default_export_filename(Utc::now()))),
                (None, false) => None,
            };
            match target {
                Some(path) => {
                    std::fs::write(&path, csv::with_bom(&content))?;
                    eprintln!("exported {} leads to {}", leads.len(), path.display());
                }
                None => println!("{content}"),
            }
        }
        LeadAction::Stats => {
            let stats = admin::lead_stats(&records::leads(&ctx.store), Utc::now());
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        LeadAction::Clear { yes } => {
            if !yes {
                return Err("refusing to delete leads without --yes".into());
            }
            admin::clear_leads(&ctx.store);
            println!("leads cleared");
        }
    }
    Ok(())
}
