// server/src/cli/handlers_reading.rs

use models::errors::ClinicResult;

use crate::cli::cli::CliContext;
use crate::cli::commands::ReadingCommand;

pub async fn handle_reading_command(
    context: &CliContext,
    action: ReadingCommand,
) -> ClinicResult<String> {
    match action {
        ReadingCommand::Push { device, bpm } => {
            context.consultations.record_reading(&device, bpm).await;
            Ok(format!("Recorded {} bpm for device {}", bpm, device))
        }
        ReadingCommand::Latest { device } => {
            match context.consultations.latest_reading(&device).await {
                Some(bpm) => Ok(format!("Latest reading for {}: {} bpm", device, bpm)),
                None => Ok(format!("No fresh reading for device {}", device)),
            }
        }
    }
}
