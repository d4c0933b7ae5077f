use log::info;

use crate::feed::{FeedPost, Page};

/// Logs a page as a table: time, kind, actor, summary.
pub fn display_page(page: &Page) {
    if log::log_enabled!(log::Level::Info) {
        let (mut user_width, mut kind_width) = (6_usize, 6_usize);
        for post in page.posts() {
            user_width = (post.post_user_username.len() + 1).max(user_width);
            kind_width = post.post_type.to_string().len().max(kind_width);
        }

        info!(
            "+-{:-<16}-+-{:-<kind_width$}-+-{:-<user_width$}-+-{}------- - -",
            " Time ", " Type ", " User ", " Post "
        );
        for post in page.posts() {
            info!(
                "| {:16} | {:kind_width$} | {:user_width$} | {}",
                post.post_created_at.format("%Y-%m-%d %H:%M"),
                post.post_type.to_string(),
                format!("@{}", post.post_user_username),
                summary(post)
            );
        }
        info!(
            "+-{}-+-{}-+-{}-+------------ - -",
            "-".repeat(16),
            "-".repeat(kind_width),
            "-".repeat(user_width)
        );
        info!("page {}: {} posts", page.index(), page.len());
        info!("");
    }
}

/// One-line description of a post, with review text trimmed.
pub fn summary(post: &FeedPost) -> String {
    const MAX_TEXT: usize = 48;

    let mut line = post.headline();
    if let Some(text) = post.review_text.as_deref().filter(|t| !t.is_empty()) {
        let text: String = if text.chars().count() > MAX_TEXT {
            let cut: String = text.chars().take(MAX_TEXT - 3).collect();
            format!("{}...", cut)
        } else {
            text.to_string()
        };
        line.push_str(&format!(" \"{}\"", text));
    }
    if !post.photo_urls().is_empty() {
        line.push_str(&format!(" [{} photos]", post.photo_urls().len()));
    }
    line
}
