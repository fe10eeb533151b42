use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use mercantile_core::{DomainError, DomainResult, Entity, EntityId, TenantId};
use mercantile_media::MediaUrl;

use crate::changes::{self, ChangeSet};
use crate::image::Image;
use crate::product::ProductId;

/// Variant identifier (tenant-scoped via `tenant_id` fields on the entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub EntityId);

impl VariantId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for VariantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Price of a variant at one selling location, in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPrice {
    pub location: String,
    pub amount: u64,
    #[serde(default)]
    pub currency: Option<String>,
}

impl LocationPrice {
    pub fn validate(&self) -> DomainResult<()> {
        if self.location.trim().is_empty() {
            return Err(DomainError::validation("price location cannot be empty"));
        }
        Ok(())
    }
}

/// Validated payload for creating a variant.
///
/// Unknown fields are captured verbatim as business attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDraft {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub weight_grams: Option<u64>,
    #[serde(default)]
    pub prices: Vec<LocationPrice>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl VariantDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("variant name cannot be empty"));
        }
        for field in [("sku", &self.sku), ("barcode", &self.barcode)] {
            if let (name, Some(v)) = field {
                if v.trim().is_empty() {
                    return Err(DomainError::validation(format!(
                        "variant {name} must be omitted or non-empty"
                    )));
                }
            }
        }
        for price in &self.prices {
            price.validate()?;
        }
        Ok(())
    }

    /// Build a draft from a staged field map (used by the update path, where
    /// variant entries without an id describe variants to create).
    pub fn from_changes(delta: &ChangeSet) -> DomainResult<Self> {
        changes::ensure_mutable(delta)?;
        let draft: Self = serde_json::from_value(Value::Object(delta.clone()))
            .map_err(|e| DomainError::validation(format!("invalid variant payload: {e}")))?;
        draft.validate()?;
        Ok(draft)
    }
}

/// Catalog entity: ProductVariant.
///
/// Owned by exactly one product; the `product` reference is immutable after
/// creation. `sku` and `barcode` are sparsely unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    id: VariantId,
    tenant_id: TenantId,
    product: ProductId,
    name: String,
    unit: Option<String>,
    sku: Option<String>,
    barcode: Option<String>,
    weight_grams: Option<u64>,
    prices: Vec<LocationPrice>,
    attributes: Map<String, Value>,
    images: Vec<Image>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductVariant {
    pub fn new(
        id: VariantId,
        tenant_id: TenantId,
        product: ProductId,
        draft: VariantDraft,
        images: Vec<Image>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            tenant_id,
            product,
            name: draft.name,
            unit: draft.unit,
            sku: draft.sku,
            barcode: draft.barcode,
            weight_grams: draft.weight_grams,
            prices: draft.prices,
            attributes: draft.attributes,
            images,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> VariantId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// The owning product. Immutable for the lifetime of the variant.
    pub fn product(&self) -> ProductId {
        self.product
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    pub fn weight_grams(&self) -> Option<u64> {
        self.weight_grams
    }

    pub fn prices(&self) -> &[LocationPrice] {
        &self.prices
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

    /// URLs of every owned image (purged after a successful deletion).
    pub fn image_urls(&self) -> Vec<MediaUrl> {
        self.images.iter().map(|img| img.url.clone()).collect()
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
    /// (`id`, `product`, `images`) are rejected before anything is touched,
    /// and the whole delta applies or none of it does.
    pub fn apply_changes(&mut self, delta: &ChangeSet, now: DateTime<Utc>) -> DomainResult<()> {
        changes::ensure_mutable(delta)?;

        let mut next = self.clone();
        for (field, value) in delta {
            match field.as_str() {
                "name" => next.name = changes::as_required_string(field, value)?,
                "unit" => next.unit = changes::as_optional_string(field, value)?,
                "sku" => next.sku = changes::as_optional_string(field, value)?,
                "barcode" => next.barcode = changes::as_optional_string(field, value)?,
                "weight_grams" => next.weight_grams = changes::as_optional_u64(field, value)?,
                "prices" => {
                    let prices: Vec<LocationPrice> = if value.is_null() {
                        Vec::new()
                    } else {
                        serde_json::from_value(value.clone()).map_err(|_| {
                            DomainError::validation("field 'prices' must be a list of location prices")
                        })?
                    };
                    for price in &prices {
                        price.validate()?;
                    }
                    next.prices = prices;
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

impl Entity for ProductVariant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
