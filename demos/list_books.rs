use bookshelf::catalog::{SortKey, ViewQuery};
use bookshelf::client::{ClientConfig, HttpBackend};
use bookshelf::controller::CatalogController;
use bookshelf::prompt::ScriptedPrompt;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let backend = HttpBackend::new(ClientConfig::new("http://127.0.0.1:3000")?)?;
    let prompt = ScriptedPrompt::answering(false);
    let mut controller = CatalogController::new(backend, &prompt)
        .with_query(ViewQuery::new("", "", Some(SortKey::Title)));

    let view = controller.refresh().await?;
    println!("Books: {} of {}", view.books.len(), view.total);
    for option in view.categories.iter() {
        println!("Genre: {}", option.label);
    }

    controller.set_search("an");
    controller.set_category("SciFi");
    for book in controller.view().books.iter() {
        println!("{} {} {}", book.id, book.title, book.author);
    }

    Ok(())
}
