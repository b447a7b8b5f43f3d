mod helpers;

use helpers::{ManifestDir, TestDb};
use routekeeper::reconcile::reconcile;
use routekeeper::routes::scan_directory;
use routekeeper::store::{EntityStore, WILDCARD};

const NAMESPACE: &str = "app::controllers";

const USERS: &str = r#"
RoutePrefix "/users"
Description "User management"

method "indexAction"
method "deleteAction"
method "searchAction" {
    Get "/search" "users.search"
}
method "formatName"
"#;

const AUTH: &str = r#"
method "loginAction" {
    Post "/login"
}
"#;

#[tokio::test]
async fn test_manifests_reconcile_into_database() {
    let db = TestDb::new().await;
    let store = db.store();
    let dir = ManifestDir::new()
        .controller("UsersController", USERS)
        .controller("AuthController", AUTH);

    let scan = scan_directory(dir.path(), NAMESPACE).unwrap();
    assert!(scan.is_clean());
    let report = reconcile(&scan.tree, store).await.unwrap();

    assert_eq!(report.added["users"], vec!["delete", "index", "search"]);
    assert_eq!(report.added["auth"], vec!["login"]);

    let users = store.find_component("users").await.unwrap().unwrap();
    assert_eq!(users.description.as_deref(), Some("User management"));
    let mut names: Vec<_> = store
        .resources(users.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["*", "delete", "index", "search"]);

    let search = store.find_resource(users.id, "search").await.unwrap().unwrap();
    assert_eq!(search.api_alias.as_deref(), Some("users.search"));

    // unchanged manifests: nothing added or removed
    let again = reconcile(&scan.tree, store).await.unwrap();
    assert!(again.is_steady());
}

#[tokio::test]
async fn test_deleted_manifest_is_soft_deleted_and_restored() {
    let db = TestDb::new().await;
    let store = db.store();
    let dir = ManifestDir::new()
        .controller("UsersController", USERS)
        .controller("AuthController", AUTH);

    let tree = scan_directory(dir.path(), NAMESPACE).unwrap().tree;
    reconcile(&tree, store).await.unwrap();
    let auth_id = store.find_component("auth").await.unwrap().unwrap().id;

    dir.remove("AuthController");
    let tree = scan_directory(dir.path(), NAMESPACE).unwrap().tree;
    let report = reconcile(&tree, store).await.unwrap();
    assert_eq!(report.removed["auth"], vec!["login"]);

    let auth = store.find_component("auth").await.unwrap().unwrap();
    assert!(auth.is_removed());
    let wildcard = store.find_resource(auth_id, WILDCARD).await.unwrap().unwrap();
    assert!(!wildcard.is_removed());

    dir.write("AuthController", AUTH);
    let tree = scan_directory(dir.path(), NAMESPACE).unwrap().tree;
    let report = reconcile(&tree, store).await.unwrap();
    assert!(report.added.is_empty());
    assert_eq!(report.updated["auth"], vec!["*", "login"]);

    let auth = store.find_component("auth").await.unwrap().unwrap();
    assert_eq!(auth.id, auth_id);
    assert!(!auth.is_removed());
}

#[tokio::test]
async fn test_broken_manifest_leaves_rows_alone() {
    let db = TestDb::new().await;
    let store = db.store();
    let dir = ManifestDir::new()
        .controller("UsersController", USERS)
        .controller("AuthController", AUTH);
    reconcile(&scan_directory(dir.path(), NAMESPACE).unwrap().tree, store)
        .await
        .unwrap();

    // three arguments on a verb directive fail the whole controller
    dir.write(
        "AuthController",
        "method \"loginAction\" {\n    Post \"/login\" \"auth.login\" \"extra\"\n}\n",
    );
    let scan = scan_directory(dir.path(), NAMESPACE).unwrap();
    assert_eq!(scan.errors.len(), 1);

    let report = reconcile(&scan.tree, store).await.unwrap();
    assert!(report.removed.is_empty());
    let auth = store.find_component("auth").await.unwrap().unwrap();
    assert!(!auth.is_removed());
    let login = store.find_resource(auth.id, "login").await.unwrap().unwrap();
    assert!(!login.is_removed());
}

#[tokio::test]
async fn test_unparseable_manifest_leaves_rows_alone() {
    let db = TestDb::new().await;
    let store = db.store();
    let dir = ManifestDir::new()
        .controller("UsersController", USERS)
        .controller("AuthController", AUTH);
    reconcile(&scan_directory(dir.path(), NAMESPACE).unwrap().tree, store)
        .await
        .unwrap();

    dir.write("AuthController", "method \"loginAction\" {\n");
    let scan = scan_directory(dir.path(), NAMESPACE).unwrap();
    assert!(scan.tree.is_skipped("auth"));
    assert!(scan.tree.get("users").is_some());

    let report = reconcile(&scan.tree, store).await.unwrap();
    assert!(report.removed.is_empty());
    let auth = store.find_component("auth").await.unwrap().unwrap();
    assert!(!auth.is_removed());
}
