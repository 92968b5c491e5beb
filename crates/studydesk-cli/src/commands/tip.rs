use clap::Subcommand;
use studydesk_core::tips::{random_tip, STUDY_TIPS};

#[derive(Subcommand)]
pub enum TipAction {
    /// Print a random study tip
    Show,
    /// Print every study tip
    List,
}

pub fn run(action: TipAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TipAction::Show => println!("{}", random_tip()),
        TipAction::List => {
            for (i, tip) in STUDY_TIPS.iter().enumerate() {
                println!("{:>2}. {tip}", i + 1);
            }
        }
    }
    Ok(())
}
