#![cfg(feature = "integration-tests")]

mod support;

use common::auth::{EntityKind, Operation};
use common::domain::{
    ContactLinkRepoInput, ContactRelationRepository, ContactRepository, DomainError,
    LinkDirection, ListRelatedRepoInput, RecordScope, RelationSide, RoleCapabilities,
};
use support::{contact_input, scope, session, setup_test_db, TestDb, HEAD_A, OWNER, PEER};

async fn seed_pair(db: &TestDb) {
    for id in ["contact-a", "contact-b"] {
        db.repositories
            .contacts
            .create_contact(contact_input(id, HEAD_A, OWNER))
            .await
            .unwrap();
    }
}

fn link(direction: LinkDirection) -> ContactLinkRepoInput {
    ContactLinkRepoInput {
        source_id: "contact-a".to_string(),
        target_id: "contact-b".to_string(),
        direction,
        source_scope: RecordScope::head(HEAD_A),
        target_scope: None,
    }
}

async fn relations_of(db: &TestDb, contact_id: &str) -> Vec<(String, RelationSide)> {
    let mut relations: Vec<(String, RelationSide)> = db
        .repositories
        .relations
        .list_relations(ListRelatedRepoInput {
            owner_kind: EntityKind::Contact,
            owner_ids: vec![contact_id.to_string()],
            scope: RecordScope::head(HEAD_A),
            limit_per_owner: None,
        })
        .await
        .unwrap()
        .into_iter()
        .map(|relation| (relation.contact.id, relation.side))
        .collect();
    relations.sort_by(|a, b| a.0.cmp(&b.0));
    relations
}

#[tokio::test]
async fn test_outgoing_link_creates_one_edge() {
    let db = setup_test_db().await;
    seed_pair(&db).await;

    let source = db
        .repositories
        .relations
        .add_links(link(LinkDirection::Outgoing))
        .await
        .unwrap();
    assert_eq!(source.id, "contact-a");

    assert_eq!(
        relations_of(&db, "contact-a").await,
        vec![("contact-b".to_string(), RelationSide::Outgoing)]
    );
    assert_eq!(
        relations_of(&db, "contact-b").await,
        vec![("contact-a".to_string(), RelationSide::Incoming)]
    );
}

#[tokio::test]
async fn test_both_then_remove_incoming_keeps_outgoing() {
    let db = setup_test_db().await;
    seed_pair(&db).await;
    let relations = &db.repositories.relations;

    relations.add_links(link(LinkDirection::Both)).await.unwrap();
    assert_eq!(relations_of(&db, "contact-a").await.len(), 2);

    relations
        .remove_links(link(LinkDirection::Incoming))
        .await
        .unwrap();

    assert_eq!(
        relations_of(&db, "contact-a").await,
        vec![("contact-b".to_string(), RelationSide::Outgoing)]
    );
}

#[tokio::test]
async fn test_adding_an_existing_edge_is_a_no_op() {
    let db = setup_test_db().await;
    seed_pair(&db).await;
    let relations = &db.repositories.relations;

    relations.add_links(link(LinkDirection::Outgoing)).await.unwrap();
    relations.add_links(link(LinkDirection::Both)).await.unwrap();

    assert_eq!(relations_of(&db, "contact-a").await.len(), 2);
    assert_eq!(relations_of(&db, "contact-b").await.len(), 2);
}

#[tokio::test]
async fn test_target_outside_edit_scope_is_rejected() {
    let db = setup_test_db().await;
    seed_pair(&db).await;
    db.repositories
        .contacts
        .create_contact(contact_input("contact-peer", HEAD_A, PEER))
        .await
        .unwrap();

    let owner = session(OWNER, HEAD_A, RoleCapabilities::default());
    let edit_scope = scope(&owner, EntityKind::Contact, Operation::Edit);

    let rejected = db
        .repositories
        .relations
        .add_links(ContactLinkRepoInput {
            source_id: "contact-a".to_string(),
            target_id: "contact-peer".to_string(),
            direction: LinkDirection::Both,
            source_scope: edit_scope.clone(),
            target_scope: Some(edit_scope),
        })
        .await;
    assert!(matches!(rejected, Err(DomainError::ContactNotFound(id)) if id == "contact-peer"));
    assert!(relations_of(&db, "contact-a").await.is_empty());
}

#[tokio::test]
async fn test_self_link_is_rejected() {
    let db = setup_test_db().await;
    seed_pair(&db).await;

    let mut input = link(LinkDirection::Both);
    input.target_id = "contact-a".to_string();

    let rejected = db.repositories.relations.add_links(input).await;
    assert!(matches!(rejected, Err(DomainError::SelfLink(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_links_on_the_same_pair_run_concurrently() {
    let db = setup_test_db().await;
    seed_pair(&db).await;

    let reversed = |direction| ContactLinkRepoInput {
        source_id: "contact-b".to_string(),
        target_id: "contact-a".to_string(),
        ..link(direction)
    };

    for _ in 0..50 {
        let forward = db.repositories.relations.clone();
        let backward = db.repositories.relations.clone();
        let first = tokio::spawn(async move { forward.add_links(link(LinkDirection::Both)).await });
        let second =
            tokio::spawn(async move { backward.add_links(reversed(LinkDirection::Both)).await });
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let forward = db.repositories.relations.clone();
        let backward = db.repositories.relations.clone();
        let first =
            tokio::spawn(async move { forward.remove_links(link(LinkDirection::Both)).await });
        let second =
            tokio::spawn(async move { backward.remove_links(reversed(LinkDirection::Both)).await });
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
    }

    assert!(relations_of(&db, "contact-a").await.is_empty());
}
