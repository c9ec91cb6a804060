use chrono::NaiveDate;
use cosearch_core::db::open_db_in_memory;
use cosearch_core::service::contribution_service::ContributionService;
use cosearch_core::service::contributor_service::ContributorService;
use cosearch_core::service::review_service::ReviewService;
use cosearch_core::service::tag_service::TagService;
use cosearch_core::view::ViewAssembler;
use cosearch_core::{
    ContributionLink, ContributionUpsert, ContributorId, ContributorUpsert, Page, ReviewUpsert,
    ServiceError, TagUpsert,
};
use rusqlite::Connection;
use std::collections::BTreeMap;

fn contribution(title: &str) -> ContributionUpsert {
    ContributionUpsert {
        title: title.to_string(),
        short_title: Some(title.to_lowercase()),
        date: NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        description: format!("{title} description"),
        links: Vec::new(),
        discord_chat_link: None,
        github_link: None,
        forum_link: None,
        wiki_link: None,
        archived_at: None,
        archive_reason: None,
        contributors: Vec::new(),
        tags: Vec::new(),
        dependencies: Vec::new(),
    }
}

fn contributor(conn: &Connection, handle: &str) -> ContributorId {
    ContributorService::new(conn)
        .create_contributor(ContributorUpsert::new(handle))
        .unwrap()
        .id
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn contributor_round_trip_keeps_every_field() {
    let conn = open_db_in_memory().unwrap();
    let service = ContributorService::new(&conn);
    let mut extra_info = BTreeMap::new();
    extra_info.insert("country".to_string(), "FR".to_string());
    let payload = ContributorUpsert {
        local_handle: "cosmo".to_string(),
        display_name: Some("Tristan Stérin".to_string()),
        discord_handle: Some("cosmo#1".to_string()),
        github_account: Some("tcosmo".to_string()),
        discourse_account: None,
        wiki_account: Some("Cosmo".to_string()),
        website: Some("https://tristan.st".to_string()),
        extra_info: Some(extra_info.clone()),
    };

    let created = service.create_contributor(payload).unwrap();
    let loaded = service.get_contributor(created.id).unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.display_name.as_deref(), Some("Tristan Stérin"));
    assert_eq!(loaded.extra_info, Some(extra_info));
    assert_eq!(
        service.get_by_local_handle("cosmo").unwrap().id,
        created.id
    );
}

#[test]
fn contributor_order_round_trips_and_reorders() {
    let conn = open_db_in_memory().unwrap();
    let a = contributor(&conn, "a");
    let b = contributor(&conn, "b");
    let service = ContributionService::new(&conn);

    let mut payload = contribution("Ordered");
    payload.contributors = vec![a, b];
    let (created, _) = service.create_contribution(payload.clone()).unwrap();
    let stored: Vec<_> = service
        .contributors(&created.id)
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(stored, vec![a, b]);

    payload.contributors = vec![b, a];
    let (_, returned) = service.update_contribution(&created.id, payload).unwrap();
    let returned: Vec<_> = returned.into_iter().map(|c| c.id).collect();
    assert_eq!(returned, vec![b, a]);

    let view = ViewAssembler::new(&conn)
        .contribution(service.get_contribution(&created.id).unwrap(), None)
        .unwrap();
    let rendered: Vec<_> = view.contributors.iter().map(|c| c.id).collect();
    assert_eq!(rendered, vec![b, a]);
}

#[test]
fn missing_reference_on_create_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let a = contributor(&conn, "a");
    let tag = TagService::new(&conn)
        .create_tag(TagUpsert::new("Decider", "#991b1b"))
        .unwrap();

    let mut payload = contribution("Broken");
    payload.contributors = vec![a];
    payload.tags = vec![tag.id];
    payload.dependencies = vec!["ghost000".to_string()];

    let err = ContributionService::new(&conn)
        .create_contribution(payload)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref what) if what == "Dependency ID ghost000"));
    assert_eq!(row_count(&conn, "contributions"), 0);
    assert_eq!(row_count(&conn, "contribution_contributors"), 0);
    assert_eq!(row_count(&conn, "contribution_tags"), 0);
}

#[test]
fn missing_reference_on_update_rolls_back_earlier_link_changes() {
    let conn = open_db_in_memory().unwrap();
    let tags = TagService::new(&conn);
    let decider = tags.create_tag(TagUpsert::new("Decider", "#991b1b")).unwrap();
    let meta = tags.create_tag(TagUpsert::new("Meta", "#1f2937")).unwrap();
    let service = ContributionService::new(&conn);

    let mut payload = contribution("Stable");
    payload.tags = vec![decider.id];
    let (created, _) = service.create_contribution(payload.clone()).unwrap();

    payload.title = "Changed".to_string();
    payload.tags = vec![meta.id];
    payload.contributors = vec![999];
    let err = service
        .update_contribution(&created.id, payload)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref what) if what == "Contributor ID 999"));

    let stored = service.get_contribution(&created.id).unwrap();
    assert_eq!(stored.title, "Stable");
    let tag_ids: Vec<i64> = conn
        .prepare("SELECT tag_id FROM contribution_tags WHERE contribution_id = ?1;")
        .unwrap()
        .query_map([&created.id], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(tag_ids, vec![decider.id]);
}

#[test]
fn children_render_their_dependencies_as_leaves() {
    let conn = open_db_in_memory().unwrap();
    let service = ContributionService::new(&conn);
    let (x, _) = service.create_contribution(contribution("X")).unwrap();
    let mut payload = contribution("Y");
    payload.dependencies = vec![x.id.clone()];
    let (y, _) = service.create_contribution(payload).unwrap();

    let children = service.children(&x.id).unwrap();
    let shorts = ViewAssembler::new(&conn)
        .contribution_shorts(&children)
        .unwrap();

    assert_eq!(shorts.len(), 1);
    assert_eq!(shorts[0].id, y.id);
    assert_eq!(shorts[0].dependencies.len(), 1);
    assert_eq!(shorts[0].dependencies[0].id, x.id);
    assert_eq!(shorts[0].dependencies[0].title, "X");
    assert!(service.children(&y.id).unwrap().is_empty());
}

#[test]
fn reviewed_contributions_lists_only_reviewed_work() {
    let conn = open_db_in_memory().unwrap();
    let reviewer = contributor(&conn, "reviewer");
    let bystander = contributor(&conn, "bystander");
    let contributions = ContributionService::new(&conn);
    let (c1, _) = contributions.create_contribution(contribution("C1")).unwrap();
    let (c2, _) = contributions.create_contribution(contribution("C2")).unwrap();
    contributions.create_contribution(contribution("C3")).unwrap();

    let reviews = ReviewService::new(&conn);
    for (contribution_id, reviewers) in [
        (&c1.id, vec![reviewer]),
        (&c2.id, vec![reviewer, bystander]),
        (&c1.id, vec![reviewer]),
    ] {
        reviews
            .create_review(ReviewUpsert {
                contribution_id: contribution_id.clone(),
                reviewers,
                link: "https://example.com/r".to_string(),
                notes: String::new(),
            })
            .unwrap();
    }

    let reviewed = ViewAssembler::new(&conn)
        .reviewed_contributions(reviewer)
        .unwrap();
    let mut ids: Vec<_> = reviewed
        .reviewed_contributions
        .iter()
        .map(|c| c.id.clone())
        .collect();
    ids.sort();
    let mut expected = vec![c1.id.clone(), c2.id.clone()];
    expected.sort();
    assert_eq!(ids, expected);

    let view = ViewAssembler::new(&conn)
        .contribution(contributions.get_contribution(&c1.id).unwrap(), None)
        .unwrap();
    assert_eq!(view.reviews.len(), 2);
}

#[test]
fn resubmitting_the_same_update_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let a = contributor(&conn, "a");
    let tag = TagService::new(&conn)
        .create_tag(TagUpsert::new("Meta", "#1f2937"))
        .unwrap();
    let service = ContributionService::new(&conn);
    let (dep, _) = service.create_contribution(contribution("Dep")).unwrap();

    let mut payload = contribution("Main");
    payload.links = vec![ContributionLink {
        description: "proof".to_string(),
        url: "https://github.com/bbchallenge".to_string(),
    }];
    let (created, _) = service.create_contribution(payload.clone()).unwrap();

    payload.contributors = vec![a];
    payload.tags = vec![tag.id];
    payload.dependencies = vec![dep.id.clone()];
    let assembler = ViewAssembler::new(&conn);
    let (first, contributors) = service
        .update_contribution(&created.id, payload.clone())
        .unwrap();
    let first_view = assembler
        .contribution(first, Some(contributors.as_slice()))
        .unwrap();
    let (second, contributors) = service.update_contribution(&created.id, payload).unwrap();
    let second_view = assembler
        .contribution(second, Some(contributors.as_slice()))
        .unwrap();

    assert_eq!(first_view.tags, second_view.tags);
    assert_eq!(first_view.contributors, second_view.contributors);
    assert_eq!(first_view.dependencies, second_view.dependencies);
    assert_eq!(first_view.links, second_view.links);
    assert_eq!(first_view.links[0].url, "https://github.com/bbchallenge");
    assert_eq!(row_count(&conn, "contribution_tags"), 1);
    assert_eq!(row_count(&conn, "contribution_dependencies"), 1);
}

#[test]
fn update_clears_empty_optional_links() {
    let conn = open_db_in_memory().unwrap();
    let service = ContributionService::new(&conn);
    let mut payload = contribution("Links");
    payload.github_link = Some("https://github.com/bbchallenge/bbchallenge".to_string());
    let (created, _) = service.create_contribution(payload.clone()).unwrap();
    assert!(created.github_link.is_some());

    payload.github_link = Some(String::new());
    payload.short_title = Some(String::new());
    let (updated, _) = service.update_contribution(&created.id, payload).unwrap();
    assert_eq!(updated.github_link, None);
    assert_eq!(updated.short_title, None);
}

#[test]
fn deleting_a_tag_unlinks_it_from_contributions() {
    let conn = open_db_in_memory().unwrap();
    let tags = TagService::new(&conn);
    let tag = tags.create_tag(TagUpsert::new("Decider", "#991b1b")).unwrap();
    let mut payload = contribution("Tagged");
    payload.tags = vec![tag.id];
    ContributionService::new(&conn)
        .create_contribution(payload)
        .unwrap();
    let view = ViewAssembler::new(&conn).tag_view(&tag).unwrap();
    assert_eq!(view.contributions.len(), 1);

    tags.delete_tag(tag.id).unwrap();
    assert_eq!(row_count(&conn, "contribution_tags"), 0);
    assert_eq!(
        ContributionService::new(&conn)
            .list_contributions(Page::default())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn list_pagination_uses_skip_and_limit() {
    let conn = open_db_in_memory().unwrap();
    for handle in ["a", "b", "c", "d"] {
        contributor(&conn, handle);
    }
    let page = ContributorService::new(&conn)
        .list_contributors(Page::new(Some(1), Some(2)))
        .unwrap();
    let handles: Vec<_> = page.iter().map(|c| c.local_handle.as_str()).collect();
    assert_eq!(handles, vec!["b", "c"]);
}
