//! End-to-end engine flows against the in-memory infrastructure.

use std::sync::Arc;

use serde_json::{json, Map};

use mercantile_auth::{Actor, PrincipalId, Role, RolePolicy};
use mercantile_catalog::{
    CategoryId, ChangeRequestStatus, ChangeSet, ProductDraft, VariantDraft,
    AUTO_REJECT_VARIANT_GONE,
};
use mercantile_core::{EntityId, TenantId};
use mercantile_engine::{
    CatalogEngine, CreateProductInput, EngineError, NewVariant, UpdateProductInput,
    VariantMutation, VariantUpsert,
};
use mercantile_infra::{
    CatalogStore, InMemoryCatalogStore, InMemoryCategoryDirectory, InMemoryInventoryLedger,
    Pagination,
};
use mercantile_media::{FileUpload, InMemoryMediaStore};

type Engine = CatalogEngine<
    Arc<InMemoryCatalogStore>,
    Arc<InMemoryMediaStore>,
    Arc<InMemoryCategoryDirectory>,
    Arc<InMemoryInventoryLedger>,
>;

struct Harness {
    tenant: TenantId,
    category: CategoryId,
    store: Arc<InMemoryCatalogStore>,
    media: Arc<InMemoryMediaStore>,
    inventory: Arc<InMemoryInventoryLedger>,
    engine: Engine,
}

impl Harness {
    fn new() -> Self {
        mercantile_observability::init();
        let tenant = TenantId::new();
        let category = CategoryId::new(EntityId::new());
        let store = Arc::new(InMemoryCatalogStore::new());
        let media = Arc::new(InMemoryMediaStore::new());
        let categories = Arc::new(InMemoryCategoryDirectory::new());
        let inventory = Arc::new(InMemoryInventoryLedger::new());
        categories.insert(tenant, category);

        let engine = CatalogEngine::new(
            store.clone(),
            media.clone(),
            categories.clone(),
            inventory.clone(),
            Arc::new(RolePolicy::default()),
        );
        Self {
            tenant,
            category,
            store,
            media,
            inventory,
            engine,
        }
    }

    fn admin(&self) -> Actor {
        Actor::new(PrincipalId::new(), self.tenant, Role::admin())
    }

    fn staff(&self) -> Actor {
        Actor::new(PrincipalId::new(), self.tenant, Role::staff())
    }

    fn product_draft(&self, name: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            brand: Some("Hillside".to_string()),
            description: Some("flagship".to_string()),
            tags: vec!["beer".to_string()],
            category: self.category,
            attributes: Map::new(),
        }
    }

    fn create(
        &self,
        name: &str,
        variants: Vec<NewVariant>,
        files: Vec<FileUpload>,
    ) -> Result<mercantile_engine::ProductWithVariants, EngineError> {
        self.engine.create_product_with_variants(
            &self.admin(),
            CreateProductInput {
                product: self.product_draft(name),
                files,
                variants,
            },
        )
    }
}

fn variant_draft(name: &str, sku: Option<&str>) -> VariantDraft {
    VariantDraft {
        name: name.to_string(),
        unit: Some("bottle".to_string()),
        sku: sku.map(str::to_string),
        barcode: None,
        weight_grams: Some(330),
        prices: vec![],
        attributes: Map::new(),
    }
}

fn delta(value: serde_json::Value) -> ChangeSet {
    value.as_object().cloned().expect("object literal")
}

fn file(name: &str) -> FileUpload {
    FileUpload::new(name, vec![0xAB; 16]).with_alt_text(name)
}

#[test]
fn create_persists_product_and_all_variants_with_media() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![
                NewVariant {
                    draft: variant_draft("330ml", Some("ALE-330")),
                    files: vec![file("v1.png")],
                },
                NewVariant::new(variant_draft("500ml", Some("ALE-500"))),
            ],
            vec![file("hero.png")],
        )
        .unwrap();

    assert_eq!(created.variants.len(), 2);
    assert_eq!(created.product.images().len(), 1);
    assert_eq!(created.variants[0].images().len(), 1);

    let stored = h
        .store
        .product(h.tenant, created.product.id_typed())
        .unwrap()
        .unwrap();
    assert_eq!(stored.name(), "Pale Ale");
    assert_eq!(
        h.store
            .variants_of_product(h.tenant, created.product.id_typed())
            .unwrap()
            .len(),
        2
    );
    // Both files live in the media store; nothing was cleaned up.
    assert_eq!(h.media.stored().len(), 2);
    assert!(h.media.deletes().is_empty());
}

#[test]
fn create_is_atomic_when_a_variant_conflicts() {
    let h = Harness::new();
    // Two variants in the same unit carrying the same sku: the whole unit
    // must abort and both uploaded images must be deleted.
    let err = h
        .create(
            "Pale Ale",
            vec![
                NewVariant {
                    draft: variant_draft("330ml", Some("DUP-1")),
                    files: vec![file("v1.png")],
                },
                NewVariant::new(variant_draft("500ml", Some("DUP-1"))),
            ],
            vec![file("hero.png")],
        )
        .unwrap_err();

    match err {
        EngineError::Conflict(msg) => assert!(msg.contains("duplicate sku"), "{msg}"),
        other => panic!("expected conflict, got {other:?}"),
    }

    // Nothing persisted: the same name can be created cleanly afterwards.
    h.create(
        "Pale Ale",
        vec![NewVariant::new(variant_draft("330ml", Some("OK-1")))],
        vec![],
    )
    .unwrap();

    // Both uploads from the failed attempt were purged.
    assert_eq!(h.media.deletes().len(), 2);
}

#[test]
fn failed_attempts_never_leak_media() {
    let h = Harness::new();
    h.create(
        "Pale Ale",
        vec![NewVariant::new(variant_draft("330ml", Some("ALE-330")))],
        vec![],
    )
    .unwrap();

    // 1 product image + 1 variant image, then the variant persist fails with
    // a conflict against the existing sku.
    let err = h
        .create(
            "Amber Ale",
            vec![NewVariant {
                draft: variant_draft("330ml", Some("ALE-330")),
                files: vec![file("v.png")],
            }],
            vec![file("p.png")],
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let uploads = h.media.uploads();
    let deletes = h.media.deletes();
    assert_eq!(uploads.len(), 2);
    assert_eq!(deletes.len(), 2);
    // Every URL uploaded during the failed attempt has a delete call.
    for url in &uploads {
        assert!(deletes.contains(url), "leaked {url}");
    }
}

#[test]
fn create_requires_an_existing_category() {
    let h = Harness::new();
    let mut draft = h.product_draft("Pale Ale");
    draft.category = CategoryId::new(EntityId::new()); // not registered

    let err = h
        .engine
        .create_product_with_variants(
            &h.admin(),
            CreateProductInput {
                product: draft,
                files: vec![file("hero.png")],
                variants: vec![NewVariant::new(variant_draft("330ml", None))],
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    // The guard fails before any upload happens.
    assert!(h.media.uploads().is_empty());
}

#[test]
fn create_requires_at_least_one_variant() {
    let h = Harness::new();
    let err = h.create("Pale Ale", vec![], vec![]).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn update_reconciles_the_variant_set() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![
                NewVariant {
                    draft: variant_draft("330ml", Some("ALE-330")),
                    files: vec![file("keep.png")],
                },
                NewVariant {
                    draft: variant_draft("500ml", Some("ALE-500")),
                    files: vec![file("drop.png")],
                },
            ],
            vec![],
        )
        .unwrap();
    let keep = &created.variants[0];
    let drop = &created.variants[1];

    let updated = h
        .engine
        .update_product_with_variants(
            &h.admin(),
            created.product.id_typed(),
            UpdateProductInput {
                changes: delta(json!({ "brand": null, "name": "House Pale Ale" })),
                variants: vec![
                    VariantUpsert {
                        id: Some(keep.id_typed()),
                        changes: delta(json!({ "name": "330ml bottle" })),
                        ..Default::default()
                    },
                    VariantUpsert {
                        id: None,
                        changes: delta(json!({ "name": "6-pack", "sku": "ALE-6PK" })),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        )
        .unwrap();

    // Partial delta semantics: null unsets, omitted fields survive.
    assert_eq!(updated.product.name(), "House Pale Ale");
    assert_eq!(updated.product.brand(), None);
    assert_eq!(updated.product.description(), Some("flagship"));

    let remaining = h
        .store
        .variants_of_product(h.tenant, created.product.id_typed())
        .unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().any(|v| v.name() == "330ml bottle"));
    assert!(remaining.iter().any(|v| v.sku() == Some("ALE-6PK")));
    // The variant absent from the target list is gone, and its media was
    // purged after commit.
    assert!(h.store.variant(h.tenant, drop.id_typed()).unwrap().is_none());
    assert_eq!(h.media.deletes(), drop.image_urls());
}

#[test]
fn update_fails_fast_when_a_dropped_variant_has_inventory() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![
                NewVariant::new(variant_draft("330ml", Some("ALE-330"))),
                NewVariant::new(variant_draft("500ml", Some("ALE-500"))),
            ],
            vec![],
        )
        .unwrap();
    let keep = &created.variants[0];
    let blocked = &created.variants[1];
    h.inventory.set_count(h.tenant, blocked.id_typed(), 1);

    let err = h
        .engine
        .update_product_with_variants(
            &h.admin(),
            created.product.id_typed(),
            UpdateProductInput {
                variants: vec![VariantUpsert {
                    id: Some(keep.id_typed()),
                    changes: delta(json!({ "name": "renamed" })),
                    files: vec![file("new.png")],
                    ..Default::default()
                }],
                ..Default::default()
            },
        )
        .unwrap_err();
    match err {
        EngineError::Conflict(msg) => assert!(msg.contains("dependent inventory"), "{msg}"),
        other => panic!("expected conflict, got {other:?}"),
    }

    // Whole-unit abort before any write or upload.
    assert!(h.store.variant(h.tenant, blocked.id_typed()).unwrap().is_some());
    let unchanged = h.store.variant(h.tenant, keep.id_typed()).unwrap().unwrap();
    assert_eq!(unchanged.name(), "330ml");
    assert!(h.media.uploads().is_empty());
}

#[test]
fn update_removes_listed_images_only_after_commit() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![file("old-hero.png")],
        )
        .unwrap();
    let old_url = created.product.images()[0].url.clone();
    let variant = &created.variants[0];

    let updated = h
        .engine
        .update_product_with_variants(
            &h.admin(),
            created.product.id_typed(),
            UpdateProductInput {
                files: vec![file("new-hero.png")],
                images_to_remove: vec![old_url.clone()],
                variants: vec![VariantUpsert {
                    id: Some(variant.id_typed()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.product.images().len(), 1);
    assert_ne!(updated.product.images()[0].url, old_url);
    assert_eq!(h.media.deletes(), vec![old_url]);
}

#[test]
fn inventory_guard_blocks_variant_deletion() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant {
                draft: variant_draft("330ml", None),
                files: vec![file("v.png")],
            }],
            vec![],
        )
        .unwrap();
    let variant = &created.variants[0];
    h.inventory.set_count(h.tenant, variant.id_typed(), 1);

    let err = h.engine.delete_variant(&h.admin(), variant.id_typed()).unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // Variant still present, and no media delete was attempted.
    assert!(h.store.variant(h.tenant, variant.id_typed()).unwrap().is_some());
    assert!(h.media.deletes().is_empty());
}

#[test]
fn delete_variant_purges_owned_media_after_commit() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant {
                draft: variant_draft("330ml", None),
                files: vec![file("v.png")],
            }],
            vec![],
        )
        .unwrap();
    let variant = &created.variants[0];

    h.engine.delete_variant(&h.admin(), variant.id_typed()).unwrap();
    assert!(h.store.variant(h.tenant, variant.id_typed()).unwrap().is_none());
    assert_eq!(h.media.deletes(), variant.image_urls());
}

#[test]
fn privileged_updates_apply_synchronously() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![],
        )
        .unwrap();
    let variant = &created.variants[0];

    let outcome = h
        .engine
        .update_variant(&h.admin(), variant.id_typed(), delta(json!({ "name": "331ml" })))
        .unwrap();
    let VariantMutation::Applied(updated) = outcome else {
        panic!("expected a direct application");
    };
    assert_eq!(updated.name(), "331ml");

    // Pre/post state differ immediately in the store.
    let stored = h.store.variant(h.tenant, variant.id_typed()).unwrap().unwrap();
    assert_eq!(stored.name(), "331ml");
}

#[test]
fn unprivileged_updates_are_staged_verbatim() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![],
        )
        .unwrap();
    let variant = &created.variants[0];
    let staged_delta = delta(json!({ "name": "331ml", "shelf_code": "B4" }));

    let outcome = h
        .engine
        .update_variant(&h.staff(), variant.id_typed(), staged_delta.clone())
        .unwrap();
    let VariantMutation::PendingReview(request) = outcome else {
        panic!("expected a staged change request");
    };

    // The live variant is untouched.
    let stored = h.store.variant(h.tenant, variant.id_typed()).unwrap().unwrap();
    assert_eq!(stored.name(), "330ml");

    // Exactly one pending request, carrying the submitted delta verbatim.
    let page = h
        .engine
        .list_change_requests(&h.admin(), None, Pagination::default())
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id_typed(), request.id_typed());
    assert_eq!(page.items[0].changes(), &staged_delta);
    assert_eq!(page.items[0].status(), ChangeRequestStatus::Pending);
}

#[test]
fn unresolved_identities_fall_back_to_the_review_path() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![],
        )
        .unwrap();

    let anonymous = Actor::least_privileged(h.tenant);
    let outcome = h
        .engine
        .update_variant(
            &anonymous,
            created.variants[0].id_typed(),
            delta(json!({ "name": "renamed" })),
        )
        .unwrap();
    assert!(matches!(outcome, VariantMutation::PendingReview(_)));
}

#[test]
fn ownership_rewrites_are_rejected_for_both_actor_classes() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![],
        )
        .unwrap();
    let variant = &created.variants[0];
    let hostile = delta(json!({ "product": EntityId::new(), "name": "x" }));

    for actor in [h.admin(), h.staff()] {
        let err = h
            .engine
            .update_variant(&actor, variant.id_typed(), hostile.clone())
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    // Rejected before any persistence: no change request exists and the
    // variant is untouched.
    let page = h
        .engine
        .list_change_requests(&h.admin(), None, Pagination::default())
        .unwrap();
    assert_eq!(page.total, 0);
    let stored = h.store.variant(h.tenant, variant.id_typed()).unwrap().unwrap();
    assert_eq!(stored.name(), "330ml");
}

#[test]
fn approval_applies_the_delta_to_current_state() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![],
        )
        .unwrap();
    let variant = &created.variants[0];

    let VariantMutation::PendingReview(request) = h
        .engine
        .update_variant(&h.staff(), variant.id_typed(), delta(json!({ "shelf_code": "B4" })))
        .unwrap()
    else {
        panic!("expected staging");
    };

    // The variant drifts between request and approval; the staged delta
    // lands on the drifted state rather than restoring the old snapshot.
    h.engine
        .update_variant(&h.admin(), variant.id_typed(), delta(json!({ "name": "331ml" })))
        .unwrap();

    let approved = h
        .engine
        .approve_change_request(&h.admin(), request.id_typed())
        .unwrap();
    assert_eq!(approved.name(), "331ml");
    assert_eq!(approved.attributes().get("shelf_code"), Some(&json!("B4")));

    let settled = h
        .store
        .change_request(h.tenant, request.id_typed())
        .unwrap()
        .unwrap();
    assert_eq!(settled.status(), ChangeRequestStatus::Approved);
    assert!(settled.reviewed_by().is_some());
}

#[test]
fn settled_requests_cannot_be_reviewed_again() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![],
        )
        .unwrap();

    let VariantMutation::PendingReview(request) = h
        .engine
        .update_variant(
            &h.staff(),
            created.variants[0].id_typed(),
            delta(json!({ "name": "renamed" })),
        )
        .unwrap()
    else {
        panic!("expected staging");
    };

    let reviewer = h.admin();
    h.engine
        .approve_change_request(&reviewer, request.id_typed())
        .unwrap();
    let settled = h
        .store
        .change_request(h.tenant, request.id_typed())
        .unwrap()
        .unwrap();

    // Second approve and a late reject both conflict and change nothing.
    let err = h
        .engine
        .approve_change_request(&h.admin(), request.id_typed())
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    let err = h
        .engine
        .reject_change_request(&h.admin(), request.id_typed(), "too late")
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let after = h
        .store
        .change_request(h.tenant, request.id_typed())
        .unwrap()
        .unwrap();
    assert_eq!(after.status(), settled.status());
    assert_eq!(after.reviewed_by(), settled.reviewed_by());
}

#[test]
fn approving_a_request_for_a_deleted_variant_auto_rejects() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![],
        )
        .unwrap();
    let variant = &created.variants[0];

    let VariantMutation::PendingReview(request) = h
        .engine
        .update_variant(&h.staff(), variant.id_typed(), delta(json!({ "name": "renamed" })))
        .unwrap()
    else {
        panic!("expected staging");
    };

    h.engine.delete_variant(&h.admin(), variant.id_typed()).unwrap();

    let err = h
        .engine
        .approve_change_request(&h.admin(), request.id_typed())
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    // The request did not stay pending: it was auto-rejected with the
    // system reason.
    let settled = h
        .store
        .change_request(h.tenant, request.id_typed())
        .unwrap()
        .unwrap();
    assert_eq!(settled.status(), ChangeRequestStatus::Rejected);
    assert_eq!(settled.rejection_reason(), Some(AUTO_REJECT_VARIANT_GONE));
}

#[test]
fn approval_conflicts_leave_the_request_pending() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![
                NewVariant::new(variant_draft("330ml", Some("ALE-330"))),
                NewVariant::new(variant_draft("500ml", Some("ALE-500"))),
            ],
            vec![],
        )
        .unwrap();
    let target = &created.variants[0];

    let VariantMutation::PendingReview(request) = h
        .engine
        .update_variant(&h.staff(), target.id_typed(), delta(json!({ "sku": "ALE-500" })))
        .unwrap()
    else {
        panic!("expected staging");
    };

    let err = h
        .engine
        .approve_change_request(&h.admin(), request.id_typed())
        .unwrap_err();
    match err {
        EngineError::Conflict(msg) => assert!(msg.contains("duplicate sku"), "{msg}"),
        other => panic!("expected conflict, got {other:?}"),
    }

    // Not consumed: it can still be rejected explicitly.
    let pending = h
        .store
        .change_request(h.tenant, request.id_typed())
        .unwrap()
        .unwrap();
    assert!(pending.is_pending());
    h.engine
        .reject_change_request(&h.admin(), request.id_typed(), "sku already taken")
        .unwrap();
}

#[test]
fn rejection_requires_a_reason() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", None))],
            vec![],
        )
        .unwrap();

    let VariantMutation::PendingReview(request) = h
        .engine
        .update_variant(
            &h.staff(),
            created.variants[0].id_typed(),
            delta(json!({ "name": "renamed" })),
        )
        .unwrap()
    else {
        panic!("expected staging");
    };

    let err = h
        .engine
        .reject_change_request(&h.admin(), request.id_typed(), "   ")
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let rejected = h
        .engine
        .reject_change_request(&h.admin(), request.id_typed(), "not needed")
        .unwrap();
    assert_eq!(rejected.status(), ChangeRequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason(), Some("not needed"));
}

#[test]
fn moderation_surfaces_are_privileged_only() {
    let h = Harness::new();
    let staff = h.staff();

    let err = h
        .engine
        .list_change_requests(&staff, None, Pagination::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));

    let request_id = mercantile_catalog::ChangeRequestId::new(EntityId::new());
    let err = h.engine.approve_change_request(&staff, request_id).unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));
    let err = h
        .engine
        .reject_change_request(&staff, request_id, "nope")
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));
}

#[test]
fn create_variant_rolls_back_its_upload_on_conflict() {
    let h = Harness::new();
    let created = h
        .create(
            "Pale Ale",
            vec![NewVariant::new(variant_draft("330ml", Some("ALE-330")))],
            vec![],
        )
        .unwrap();

    let err = h
        .engine
        .create_variant(
            &h.admin(),
            created.product.id_typed(),
            variant_draft("also 330ml", Some("ALE-330")),
            vec![file("v.png")],
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // The one upload of the failed attempt was purged.
    assert_eq!(h.media.uploads().len(), 1);
    assert_eq!(h.media.deletes().len(), 1);
    assert_eq!(
        h.store
            .variants_of_product(h.tenant, created.product.id_typed())
            .unwrap()
            .len(),
        1
    );
}
