// server/src/cli/handlers_publication.rs

use std::fmt::Write as FmtWrite;

use models::errors::ClinicResult;
use models::publications::NewPublication;

use crate::cli::cli::CliContext;
use crate::cli::commands::PublicationCommand;

pub async fn handle_publication_command(
    context: &CliContext,
    caller: Option<&str>,
    action: PublicationCommand,
) -> ClinicResult<String> {
    match action {
        PublicationCommand::Add { title, image, draft } => {
            let author = context.resolve_caller(caller).await?;
            let stored = context
                .publications
                .publish(
                    &author,
                    NewPublication {
                        title,
                        image_path: image,
                        published: !draft,
                    },
                )
                .await?;
            if stored.published {
                Ok(format!("Published announcement {}", stored.id))
            } else {
                Ok(format!("Stored draft announcement {}", stored.id))
            }
        }
        PublicationCommand::List { limit } => {
            let feed = context.publications.latest(limit).await?;
            if feed.is_empty() {
                return Ok("No published announcements".to_string());
            }
            let mut out = format!("{} announcements", feed.len());
            for publication in feed {
                let _ = write!(
                    out,
                    "\n{} | {}",
                    publication.published_at, publication.title
                );
            }
            Ok(out)
        }
    }
}
