use clap::Subcommand;

use super::Session;

#[derive(Subcommand)]
pub enum AlbumAction {
    /// Add an album
    Add {
        /// Album name
        name: String,
    },
    /// List albums by name
    List,
}

pub fn run(action: AlbumAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    match action {
        AlbumAction::Add { name } => {
            let album = session.db.add_album(&name)?;
            println!("Album created: {}", album.id);
            super::print_json(&album)?;
        }
        AlbumAction::List => super::print_json(&session.db.list_albums()?)?,
    }
    Ok(())
}
