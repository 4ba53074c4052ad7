use bookshelf::client::{ClientConfig, HttpBackend};
use bookshelf::controller::CatalogController;
use bookshelf::model::{BookDraft, BookId};
use bookshelf::prompt::ScriptedPrompt;
use std::error::Error;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ClientConfig::new("http://127.0.0.1:3000")?.with_timeout(Duration::from_secs(5));
    let prompt = ScriptedPrompt::answering(true);
    let mut controller = CatalogController::new(HttpBackend::new(config)?, &prompt);

    let view = controller
        .create(&BookDraft {
            title: "Kindred".to_string(),
            author: "Octavia E. Butler".to_string(),
            genre: "SciFi".to_string(),
            published_year: "1979".to_string(),
            ..BookDraft::default()
        })
        .await?;

    let Some(added) = view.books.iter().find(|b| b.title == "Kindred") else {
        return Err("created book not found in refreshed list".into());
    };
    let id: BookId = added.id.clone();

    let mut draft = controller.edit(&id).await?;
    draft.kstatus = "read".to_string();
    draft.krates = "5".to_string();
    controller.commit(&draft).await?;

    for notice in prompt.notices() {
        println!("{notice}");
    }

    Ok(())
}
