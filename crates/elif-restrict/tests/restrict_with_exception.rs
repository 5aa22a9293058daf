mod common;

use std::sync::Arc;

use common::Harness;
use elif_restrict::{
    AssociationReflection, DeleteGuard, DeletionDecision, DependentPolicy, HookChain,
    MessageFormatter, RestrictError, SampleEntry,
};

fn category_orders(harness: &Harness) {
    harness
        .guard
        .declare(
            "Category",
            AssociationReflection::has_many("orders", "Order", "category_id"),
            DependentPolicy::RestrictWithException,
        )
        .unwrap();
    harness
        .guard
        .declare(
            "Order",
            AssociationReflection::has_one("order_invoice", "OrderInvoice", "order_id"),
            DependentPolicy::RestrictWithException,
        )
        .unwrap();
}

fn blocked(result: Result<bool, RestrictError>) -> elif_restrict::BlockedDeletionError {
    match result {
        Err(RestrictError::Blocked(error)) => error,
        other => panic!("Expected a blocked delete, got {:?}", other),
    }
}

#[test]
fn test_has_many_blocks_until_orders_are_gone() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let category = db.create("Category", &[]);
    for _ in 0..5 {
        db.create("Order", &[("category_id", category.id)]);
    }

    let error = blocked(harness.destroy(category));
    assert_eq!(
        error.to_string(),
        "Cannot delete record because 5 dependent orders exist"
    );
    assert_eq!(
        error.detailed_message(),
        "Cannot delete record because 5 dependent orders exist\n\n\nThese include:\n1: Order 1\n2: Order 2\n3: Order 3\n4: Order 4\n5: Order 5"
    );
    assert!(db.find("Category", category.id).is_some());

    db.create("Order", &[("category_id", category.id)]);
    let error = blocked(harness.destroy(category));
    assert_eq!(
        error.basic_message(),
        "Cannot delete record because 6 dependent orders exist"
    );
    assert_eq!(
        error.detailed_message(),
        "Cannot delete record because 6 dependent orders exist\n\n\nThese include:\n1: Order 1\n2: Order 2\n3: Order 3\n4: Order 4\n...and 2 more"
    );
    assert_eq!(error.sample()[4], SampleEntry::More { remaining: 2 });

    db.delete_all("Order");
    assert!(harness.destroy(category).unwrap());
    assert!(db.find("Category", category.id).is_none());
}

#[test]
fn test_seven_dependents_report_three_more() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let category = db.create("Category", &[]);
    for _ in 0..7 {
        db.create("Order", &[("category_id", category.id)]);
    }

    let error = blocked(harness.destroy(category));
    assert_eq!(error.count(), 7);
    assert_eq!(error.sample().len(), 5);
    assert!(error.detailed_message().ends_with("4: Order 4\n...and 3 more"));
}

#[test]
fn test_single_dependent_uses_singular_wording() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let category = db.create("Category", &[]);
    db.create("Order", &[("category_id", category.id)]);

    let error = blocked(harness.destroy(category));
    assert_eq!(
        error.to_string(),
        "Cannot delete record because dependent order exists"
    );
    assert_eq!(error.display_name(), "order");
    assert!(!error.detailed_message().contains("more"));
}

#[test]
fn test_only_own_dependents_count() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let busy = db.create("Category", &[]);
    let empty = db.create("Category", &[]);
    db.create("Order", &[("category_id", busy.id)]);
    db.create("Order", &[("category_id", busy.id)]);

    assert!(harness.destroy(busy).is_err());
    assert!(harness.destroy(empty).unwrap());
    assert_eq!(db.count_of("Category"), 1);
}

#[test]
fn test_has_one_block() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let order = db.create("Order", &[]);
    let invoice = db.create("OrderInvoice", &[("order_id", order.id)]);

    let error = blocked(harness.destroy(order));
    assert_eq!(
        error.to_string(),
        "Cannot delete record because dependent order invoice exists"
    );
    assert_eq!(error.count(), 1);

    db.delete_row(invoice);
    assert!(harness.destroy(order).unwrap());
    assert_eq!(db.count_of("Order"), 0);
}

#[test]
fn test_has_and_belongs_to_many_through_pivot() {
    let harness = Harness::new();
    harness
        .guard
        .declare(
            "Tag",
            AssociationReflection::has_and_belongs_to_many(
                "posts",
                "Post",
                "PostsTags",
                "tag_id",
                "post_id",
            ),
            DependentPolicy::RestrictWithException,
        )
        .unwrap();
    let db = &harness.db;

    let tag = db.create("Tag", &[]);
    let post = db.create("Post", &[]);
    let link = db.create("PostsTags", &[("tag_id", tag.id), ("post_id", post.id)]);

    let error = blocked(harness.destroy(tag));
    assert_eq!(
        error.detailed_message(),
        "Cannot delete record because dependent post exists\n\n\nThese include:\n1: Post 1"
    );

    db.delete_row(link);
    assert!(harness.destroy(tag).unwrap());
}

#[test]
fn test_first_blocking_association_wins() {
    let harness = Harness::new();
    harness
        .guard
        .declare(
            "Category",
            AssociationReflection::has_many("orders", "Order", "category_id"),
            DependentPolicy::RestrictWithException,
        )
        .unwrap();
    harness
        .guard
        .declare(
            "Category",
            AssociationReflection::has_many("products", "Product", "category_id"),
            DependentPolicy::RestrictWithException,
        )
        .unwrap();
    let db = &harness.db;

    let category = db.create("Category", &[]);
    db.create("Order", &[("category_id", category.id)]);
    db.create("Product", &[("category_id", category.id)]);

    let error = blocked(harness.destroy(category));
    assert_eq!(error.association_name(), "orders");
    assert!(!db.queries().iter().any(|query| query.ends_with("Product")));

    db.delete_all("Order");
    let error = blocked(harness.destroy(category));
    assert_eq!(error.association_name(), "products");
    assert_eq!(error.target_type(), "Product");
}

#[test]
fn test_check_without_hooks() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let category = db.create("Category", &[]);
    assert!(harness.guard.check(&category, db).unwrap().is_allowed());

    db.create("Order", &[("category_id", category.id)]);
    assert!(matches!(
        harness.guard.check(&category, db).unwrap(),
        DeletionDecision::Block(_)
    ));
}

#[test]
fn test_redeclaring_as_none_lifts_the_restriction() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let category = db.create("Category", &[]);
    db.create("Order", &[("category_id", category.id)]);
    assert!(harness.destroy(category).is_err());

    harness
        .guard
        .declare(
            "Category",
            AssociationReflection::has_many("orders", "Order", "category_id"),
            DependentPolicy::None,
        )
        .unwrap();
    db.clear_queries();

    assert!(harness.destroy(category).unwrap());
    assert!(db.queries().is_empty());
}

#[test]
fn test_second_host_hook_chain_also_blocks() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let second = HookChain::new();
    harness.guard.install_hooks(Arc::new(second.clone()));
    assert_eq!(second.hook_count("Category"), 1);
    assert_eq!(harness.hooks.hook_count("Category"), 1);

    let category = db.create("Category", &[]);
    db.create("Order", &[("category_id", category.id)]);

    blocked(db.destroy(&second, category));
    blocked(harness.destroy(category));
    assert!(db.find("Category", category.id).is_some());
}

#[test]
fn test_guard_sharing_a_registry_blocks_on_its_own_host() {
    let harness = Harness::new();
    category_orders(&harness);
    let db = &harness.db;

    let other_hooks = HookChain::new();
    let other_guard = DeleteGuard::new(harness.guard.registry().clone(), MessageFormatter::new());
    other_guard.install_hooks(Arc::new(other_hooks.clone()));
    assert_eq!(other_hooks.hook_count("Category"), 1);

    let category = db.create("Category", &[]);
    db.create("Order", &[("category_id", category.id)]);

    let error = blocked(db.destroy(&other_hooks, category));
    assert_eq!(error.association_name(), "orders");
    assert!(db.find("Category", category.id).is_some());

    db.delete_all("Order");
    assert!(db.destroy(&other_hooks, category).unwrap());
}
