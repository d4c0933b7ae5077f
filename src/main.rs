use std::error::Error;

use log::{error, info};
use social_feed::{
    config::Config,
    display::display_page,
    feed::{FeedController, LoadOutcome},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::parse();
    config.init_logger();
    info!("# Social Feed #");
    info!("");

    let provider = config.provider()?;
    let controller = FeedController::new(provider);
    controller.initialize(config.viewer(), config.filter());

    match config.viewer() {
        Some(viewer) => info!("Loading {} feed for {}", config.filter(), viewer),
        None => info!("No viewer given, the feed is empty"),
    }
    info!("");

    let mut loaded = 0;
    while controller.has_more() && config.pages().map_or(true, |max| loaded < max) {
        match controller.load_next_page().await {
            Ok(LoadOutcome::Applied { page_index, .. }) => {
                loaded += 1;
                let Some(page) = controller.page(page_index) else {
                    continue;
                };
                if config.json() {
                    for post in page.posts() {
                        println!("{}", serde_json::to_string(post)?);
                    }
                } else {
                    display_page(&page);
                }
            }
            Ok(_) => break,
            Err(e) => {
                error!("Failed to load page {}: {}", loaded, e);
                return Err(e.into());
            }
        }
    }

    let total = controller.current_posts().len();
    info!("{} pages", controller.page_count());
    info!("{} posts", total);
    info!("{} distinct", controller.distinct_posts().len());
    if controller.has_more() {
        info!("more posts available");
    }
    info!("All done!");
    Ok(())
}
