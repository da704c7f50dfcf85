use async_trait::async_trait;

use super::models::{JikanItem, JikanList};
use crate::modules::catalog::domain::value_objects::{EntityKind, MalId};
use crate::modules::provider::domain::{
    entities::{ForeignAnime, ForeignCharacter, ForeignPayload},
    repositories::MetadataProvider,
    value_objects::UpstreamSearch,
};
use crate::modules::provider::infrastructure::http_client::RateLimitClient;
use crate::shared::config::CatalogConfig;
use crate::shared::errors::{AppResult, UpstreamResult};

/// Jikan caps list endpoints at 25 items per page
const MAX_SEARCH_LIMIT: u32 = 25;

/// Jikan (MyAnimeList) REST client
pub struct JikanProvider {
    http_client: RateLimitClient,
    base_url: String,
}

impl JikanProvider {
    pub fn new(http_client: RateLimitClient, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> AppResult<Self> {
        let http_client = RateLimitClient::for_jikan(
            config.jikan_requests_per_second,
            config.jikan_burst,
            config.upstream_timeout,
        )?;
        Ok(Self::new(http_client, config.jikan_base_url.clone()))
    }

    pub fn entity_url(&self, kind: EntityKind, id: MalId) -> String {
        match kind {
            EntityKind::Anime => format!("{}/anime/{}/full", self.base_url, id),
            EntityKind::Character => format!("{}/characters/{}/full", self.base_url, id),
        }
    }

    pub fn search_url(&self, kind: EntityKind, search: &UpstreamSearch) -> String {
        let mut url = format!(
            "{}/{}?q={}&page={}&limit={}",
            self.base_url,
            match kind {
                EntityKind::Anime => "anime",
                EntityKind::Character => "characters",
            },
            urlencoding::encode(search.text.trim()),
            search.page.max(1),
            search.limit.clamp(1, MAX_SEARCH_LIMIT)
        );

        match kind {
            EntityKind::Anime => {
                if let Some(status) = search.status.and_then(|s| s.upstream_param()) {
                    url.push_str(&format!("&status={}", status));
                }
                let genre_ids: Vec<String> = search
                    .genres
                    .iter()
                    .filter_map(|g| genre_id(g))
                    .map(|id| id.to_string())
                    .collect();
                if !genre_ids.is_empty() {
                    url.push_str(&format!("&genres={}", genre_ids.join(",")));
                }
            }
            EntityKind::Character => url.push_str("&order_by=favorites&sort=desc"),
        }
        url
    }
}

#[async_trait]
impl MetadataProvider for JikanProvider {
    async fn get_entity(&self, kind: EntityKind, id: MalId) -> UpstreamResult<ForeignPayload> {
        let url = self.entity_url(kind, id);
        log::info!("Jikan: Getting {} {}", kind, id);

        match kind {
            EntityKind::Anime => {
                let response: JikanItem<ForeignAnime> = self.http_client.get(&url).await?;
                Ok(ForeignPayload::Anime(response.data))
            }
            EntityKind::Character => {
                let response: JikanItem<ForeignCharacter> = self.http_client.get(&url).await?;
                Ok(ForeignPayload::Character(response.data))
            }
        }
    }

    async fn search(
        &self,
        kind: EntityKind,
        search: &UpstreamSearch,
    ) -> UpstreamResult<Vec<ForeignPayload>> {
        let url = self.search_url(kind, search);
        log::info!("Jikan: Searching {} for '{}'", kind, search.text);

        let results: Vec<ForeignPayload> = match kind {
            EntityKind::Anime => {
                let response: JikanList<ForeignAnime> = self.http_client.get(&url).await?;
                response.data.into_iter().map(ForeignPayload::Anime).collect()
            }
            EntityKind::Character => {
                let response: JikanList<ForeignCharacter> = self.http_client.get(&url).await?;
                response
                    .data
                    .into_iter()
                    .map(ForeignPayload::Character)
                    .collect()
            }
        };

        log::info!(
            "Jikan: Found {} {} results for '{}'",
            results.len(),
            kind,
            search.text
        );
        Ok(results)
    }

    fn name(&self) -> &str {
        self.http_client.provider_name()
    }
}

/// MyAnimeList genre ids for the genres the search endpoint filters on
fn genre_id(name: &str) -> Option<u32> {
    let id = match name.trim().to_lowercase().as_str() {
        "action" => 1,
        "adventure" => 2,
        "avant garde" => 5,
        "award winning" => 46,
        "comedy" => 4,
        "drama" => 8,
        "fantasy" => 10,
        "horror" => 14,
        "mystery" => 7,
        "romance" => 22,
        "sci-fi" => 24,
        "slice of life" => 36,
        "sports" => 30,
        "supernatural" => 37,
        "suspense" => 41,
        _ => return None,
    };
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::domain::value_objects::AnimeStatus;
    use crate::modules::provider::infrastructure::http_client::RetryPolicy;
    use std::time::Duration;

    fn provider() -> JikanProvider {
        let client = RateLimitClient::new(
            "Jikan",
            RetryPolicy::none(),
            RateLimitClient::create_rate_limiter(1.0, 1),
            Duration::from_secs(1),
        )
        .unwrap();
        JikanProvider::new(client, "https://api.jikan.moe/v4/")
    }

    #[test]
    fn entity_urls_use_full_endpoints() {
        let provider = provider();
        assert_eq!(
            provider.entity_url(EntityKind::Anime, 5114),
            "https://api.jikan.moe/v4/anime/5114/full"
        );
        assert_eq!(
            provider.entity_url(EntityKind::Character, 11),
            "https://api.jikan.moe/v4/characters/11/full"
        );
    }

    #[test]
    fn search_url_encodes_text_and_hints() {
        let search = UpstreamSearch {
            text: "fullmetal alchemist".into(),
            status: Some(AnimeStatus::Finished),
            genres: vec!["Action".into(), "Mecha-ish".into()],
            page: 1,
            limit: 100,
        };
        assert_eq!(
            provider().search_url(EntityKind::Anime, &search),
            "https://api.jikan.moe/v4/anime?q=fullmetal%20alchemist&page=1&limit=25&status=complete&genres=1"
        );
    }
}
