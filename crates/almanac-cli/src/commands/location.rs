//! Location reference data.

use almanac_core::EventDb;
use clap::Subcommand;

use super::Session;

#[derive(Subcommand)]
pub enum LocationAction {
    /// Add a location
    Add {
        /// Location name
        name: String,
        /// Slug of the category the location belongs to
        #[arg(long)]
        category_slug: String,
        /// Display name of the category
        #[arg(long)]
        category_name: String,
    },
    /// List locations by name
    List,
}

pub fn run(action: LocationAction) -> Result<(), Box<dyn std::error::Error>> {
    let Session { db, .. } = Session::open()?;
    match action {
        LocationAction::Add {
            name,
            category_slug,
            category_name,
        } => {
            let location = db.add_location(&name, &category_slug, &category_name)?;
            println!("Location created: {}", location.id);
            super::print_json(&location)?;
        }
        LocationAction::List => list(&db)?,
    }
    Ok(())
}

fn list(db: &EventDb) -> Result<(), Box<dyn std::error::Error>> {
    super::print_json(&db.list_locations()?)
}
