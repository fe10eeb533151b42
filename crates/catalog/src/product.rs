use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use mercantile_core::{DomainError, DomainResult, Entity, EntityId, TenantId};
use mercantile_media::MediaUrl;

use crate::changes::{self, ChangeSet};
use crate::image::Image;

/// Product identifier (tenant-scoped via `tenant_id` fields on the entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of a category node in the external catalog hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub EntityId);

impl CategoryId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Validated payload for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: CategoryId,
    /// Arbitrary descriptive fields carried as-is.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ProductDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(DomainError::validation("product tags cannot be empty"));
        }
        Ok(())
    }
}

/// Catalog entity: Product.
///
/// Created atomically with at least one variant; updated in place; never
/// hard-deleted by this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    tenant_id: TenantId,
    name: String,
    brand: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    category: CategoryId,
    attributes: Map<String, Value>,
    images: Vec<Image>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: ProductId,
        tenant_id: TenantId,
        draft: ProductDraft,
        images: Vec<Image>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            tenant_id,
            name: draft.name,
            brand: draft.brand,
            description: draft.description,
            tags: draft.tags,
            category: draft.category,
            attributes: draft.attributes,
            images,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append newly uploaded images to the image list.
    pub fn push_images(&mut self, images: impl IntoIterator<Item = Image>) {
        self.images.extend(images);
    }

    /// Remove images whose URL is in `urls`, returning the URLs actually
    /// removed (for post-commit media deletion).
    pub fn remove_images(&mut self, urls: &[MediaUrl]) -> Vec<MediaUrl> {
        let mut removed = Vec::new();
        self.images.retain(|img| {
            if urls.contains(&img.url) {
                removed.push(img.url.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Merge a staged delta onto the current state.
    ///
    /// Known fields are validated and written; unknown fields land in the
    /// business attribute map (`null` removes the attribute). Guarded fields
    /// are rejected before anything is touched.
    pub fn apply_changes(&mut self, delta: &ChangeSet, now: DateTime<Utc>) -> DomainResult<()> {
        changes::ensure_mutable(delta)?;

        let mut next = self.clone();
        for (field, value) in delta {
            match field.as_str() {
                "name" => next.name = changes::as_required_string(field, value)?,
                "brand" => next.brand = changes::as_optional_string(field, value)?,
                "description" => next.description = changes::as_optional_string(field, value)?,
                "tags" => next.tags = changes::as_string_list(field, value)?,
                "category" => {
                    next.category = serde_json::from_value(value.clone()).map_err(|_| {
                        DomainError::validation("field 'category' must be a category id")
                    })?
                }
                _ => {
                    if value.is_null() {
                        next.attributes.remove(field);
                    } else {
                        next.attributes.insert(field.clone(), value.clone());
                    }
                }
            }
        }
        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Extract a staged category change from a product delta, if any.
///
/// The category reference is only re-validated against the hierarchy service
/// when the delta actually changes it; this helper lets the coordinator make
/// that call before applying anything.
pub fn staged_category(delta: &ChangeSet) -> DomainResult<Option<CategoryId>> {
    match delta.get("category") {
        None => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|_| DomainError::validation("field 'category' must be a category id")),
    }
}
