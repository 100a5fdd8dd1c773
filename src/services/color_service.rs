use std::sync::Arc;

use tracing::{debug, info};
use validator::Validate;

use crate::db::DatabasePool;
use crate::error::{AppError, AppResult};
use crate::models::{
    name_key, normalize_hex, Color, ColorChanges, ColorQuery, ColorsListResponse, CreateColorRequest,
    NewColor, UpdateColorRequest,
};
use crate::repositories::{ColorRepository, SqlColorRepository};

/// Enforces the catalog's format and uniqueness rules on top of a
/// [`ColorRepository`].
pub struct ColorService {
    repo: Arc<dyn ColorRepository>,
    default_page_size: u32,
}

impl ColorService {
    pub fn new(db: DatabasePool, default_page_size: u32) -> Self {
        Self::with_repository(Arc::new(SqlColorRepository::new(db)), default_page_size)
    }

    pub fn with_repository(repo: Arc<dyn ColorRepository>, default_page_size: u32) -> Self {
        Self {
            repo,
            default_page_size: default_page_size.max(1),
        }
    }

    pub async fn create_color(&self, req: CreateColorRequest) -> AppResult<Color> {
        req.validate()?;

        let hex = normalize_hex(&req.hex);

        if self.repo.find_by_name(&req.name, None).await?.is_some() {
            return Err(AppError::NameConflict(req.name));
        }
        if self.repo.find_by_hex(&hex, None).await?.is_some() {
            return Err(AppError::HexConflict(req.hex));
        }

        let color = self
            .repo
            .insert(&NewColor {
                name: req.name,
                hex,
                rgb: req.rgb,
            })
            .await?;

        info!("Created color {} ({}) with id {}", color.name, color.hex, color.id);
        Ok(color)
    }

    pub async fn list_all_colors(&self) -> AppResult<Vec<Color>> {
        self.repo.find_all().await
    }

    /// Paginated listing. `page` and `page_size` are clamped to at least 1;
    /// an empty search term means no filter.
    pub async fn list_colors(
        &self,
        page: Option<i64>,
        page_size: Option<i64>,
        search: Option<String>,
    ) -> AppResult<ColorsListResponse> {
        let page = clamp_to_u32(page.unwrap_or(1));
        let page_size = clamp_to_u32(page_size.unwrap_or(self.default_page_size as i64));
        let search = search.filter(|s| !s.is_empty());

        let query = ColorQuery {
            offset: (page as i64 - 1).saturating_mul(page_size as i64),
            limit: page_size as i64,
            search,
        };
        let (colors, total) = self.repo.find_page(&query).await?;

        Ok(ColorsListResponse {
            colors,
            total,
            page,
            page_size,
        })
    }

    pub async fn get_color(&self, id: i64) -> AppResult<Color> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Color with id {} not found", id)))
    }

    pub async fn get_color_by_name(&self, name: &str) -> AppResult<Color> {
        self.repo
            .find_by_name(name, None)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Color with name \"{}\" not found", name)))
    }

    pub async fn update_color(&self, id: i64, req: UpdateColorRequest) -> AppResult<Color> {
        let current = self.get_color(id).await?;

        req.validate()?;

        let mut changes = ColorChanges::default();

        if let Some(name) = req.name {
            if name_key(&name) != name_key(&current.name)
                && self.repo.find_by_name(&name, Some(id)).await?.is_some()
            {
                return Err(AppError::NameConflict(name));
            }
            // A case-only rename is still a change.
            if name != current.name {
                changes.name = Some(name);
            }
        }

        if let Some(hex) = req.hex {
            let normalized = normalize_hex(&hex);
            if normalized != current.hex {
                if self.repo.find_by_hex(&normalized, Some(id)).await?.is_some() {
                    return Err(AppError::HexConflict(hex));
                }
                changes.hex = Some(normalized);
            }
        }

        if let Some(rgb) = req.rgb {
            if rgb != current.rgb {
                changes.rgb = Some(rgb);
            }
        }

        if changes.is_empty() {
            debug!("Update of color {} changes nothing", id);
            return Ok(current);
        }

        self.repo.update(id, &changes).await?;
        info!("Updated color {}", id);

        self.get_color(id).await
    }

    /// Deletes the color and returns it as it was before deletion.
    pub async fn delete_color(&self, id: i64) -> AppResult<Color> {
        let color = self.get_color(id).await?;

        if self.repo.delete(id).await? == 0 {
            return Err(AppError::NotFound(format!("Color with id {} not found", id)));
        }

        info!("Deleted color {} ({})", color.name, id);
        Ok(color)
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    value.clamp(1, u32::MAX as i64) as u32
}
