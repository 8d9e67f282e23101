use crate::models::ContentType;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct Args {
    #[clap(long, value_enum, default_value = "story")]
    pub content_type: ContentType,

    #[clap(long, default_value = "./data")]
    pub data_dir: String,

    #[clap(long, default_value = "./res/backgrounds")]
    pub backgrounds: String,

    #[clap(long, default_value = "./res/background_music.mp3")]
    pub music: String,

    #[clap(long, default_value = "./scratch")]
    pub scratch_dir: String,

    /// Reconcile the chapter counter against published history and exit.
    #[clap(long)]
    pub reconcile_only: bool,
}
