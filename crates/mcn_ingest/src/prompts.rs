use mcn_core::{Article, Category};

/// Instruction for one news refresh.
pub fn news_prompt(region: &str, count: usize, recent_titles: &[String], categories: &[Category]) -> String {
    let titles = serde_json::to_string(recent_titles).unwrap_or_else(|_| "[]".to_string());
    let categories = serde_json::to_string(categories).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are a news aggregation AI. Your task is to find {count} recent, diverse, top news stories from {region}.
Existing article titles to avoid if possible: {titles}.
For each story, you must provide:
1. title: The headline of the article.
2. description: A detailed, single-paragraph summary.
3. url: The direct URL to the original article.
4. source: The name of the news publication (e.g., "CBC News").
5. category: The most appropriate category from this list: {categories}.

Your response MUST be a single, valid JSON array of objects inside a markdown code block. Do not include any other text, explanation, or commentary outside of the markdown block.
The JSON structure must be:
[{{ "title": string, "description": string, "url": string, "source": string, "category": string }}]"#
    )
}

pub fn cover_image_prompt(article: &Article) -> String {
    format!(
        "A visually appealing and relevant image for a news article with the title \"{}\" and summary: \"{}\". \
         The image should be in a modern photorealistic style, suitable for a news website header. \
         Do not include any text or logos in the image.",
        article.title, article.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_prompt_embeds_parameters() {
        let prompt = news_prompt(
            "Canada",
            4,
            &["Budget passes".to_string()],
            &[Category::World, Category::Health],
        );
        assert!(prompt.contains("find 4 recent"));
        assert!(prompt.contains("from Canada."));
        assert!(prompt.contains(r#"["Budget passes"]"#));
        assert!(prompt.contains(r#"["world","health"]"#));
        assert!(prompt.contains(r#"[{ "title": string"#));
    }
}
