//! Messaging service tests
//!
//! Exercise the conversation directory, message store and unread aggregator against a real
//! database without going through HTTP.

mod common;

use common::{connection, file_pool, insert_project, insert_user, remove_file_db, test_pool};
use di::Ref;
use sqlx::SqlitePool;
use studio_portal_api::config::AppConfig;
use studio_portal_api::core::errors::ServiceError;
use studio_portal_api::core::services::{
    ConversationMessageStore, ConversationUnreadAggregator, ProjectConversationDirectory,
};
use studio_portal_api::core::session::Session;
use studio_portal_api::core::traits::{ConversationDirectory, MessageStore, UnreadAggregator};
use studio_portal_api::infrastructure::entities::Role;
use studio_portal_api::infrastructure::repositories::{
    DbConversationRepository, DbMessageRepository,
};
use uuid::Uuid;

struct Messaging {
    directory: ProjectConversationDirectory,
    store: ConversationMessageStore,
    unread: ConversationUnreadAggregator,
}

fn messaging(pool: &SqlitePool, config: AppConfig) -> Messaging {
    let connection = connection(pool);
    let messages = Ref::new(DbMessageRepository::new(connection.clone()));

    Messaging {
        directory: ProjectConversationDirectory::new(Ref::new(DbConversationRepository::new(
            connection,
        ))),
        store: ConversationMessageStore::new(messages.clone(), Ref::new(config)),
        unread: ConversationUnreadAggregator::new(messages),
    }
}

/// An admin, an editor and a client who owns one project.
struct Fixture {
    pool: SqlitePool,
    admin: Session,
    editor: Session,
    client: Session,
    project_id: Uuid,
}

async fn fixture() -> Fixture {
    fixture_on(test_pool().await).await
}

async fn fixture_on(pool: SqlitePool) -> Fixture {
    let admin = Session::new(insert_user(&pool, Role::Admin, "Ada").await, Role::Admin);
    let editor = Session::new(insert_user(&pool, Role::Editor, "Ed").await, Role::Editor);
    let client = Session::new(insert_user(&pool, Role::Client, "Cleo").await, Role::Client);
    let project_id = insert_project(&pool, client.user_id, "Website").await;

    Fixture {
        pool,
        admin,
        editor,
        client,
        project_id,
    }
}

#[tokio::test]
async fn test_get_or_create_is_idempotent() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());

    let first = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();
    let second = messaging
        .directory
        .get_or_create_conversation(&fx.admin, fx.project_id)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.project_id, fx.project_id);
}

#[tokio::test]
async fn test_concurrent_get_or_create_converges() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());

    let (a, b, c) = tokio::join!(
        messaging
            .directory
            .get_or_create_conversation(&fx.client, fx.project_id),
        messaging
            .directory
            .get_or_create_conversation(&fx.admin, fx.project_id),
        messaging
            .directory
            .get_or_create_conversation(&fx.editor, fx.project_id),
    );

    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert_eq!(a.id, b.id);
    assert_eq!(b.id, c.id);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE project_id = ?")
        .bind(fx.project_id)
        .fetch_one(&fx.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_client_cannot_open_foreign_project() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());
    let other = Session::new(
        insert_user(&fx.pool, Role::Client, "Cato").await,
        Role::Client,
    );

    let foreign = messaging
        .directory
        .get_or_create_conversation(&other, fx.project_id)
        .await
        .unwrap_err();
    let missing = messaging
        .directory
        .get_or_create_conversation(&other, Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(foreign, ServiceError::NotFound("project")));
    assert!(matches!(missing, ServiceError::NotFound("project")));
}

#[tokio::test]
async fn test_check_access_hides_foreign_conversations() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());
    let other = Session::new(
        insert_user(&fx.pool, Role::Client, "Cato").await,
        Role::Client,
    );
    let viewer = Session::new(
        insert_user(&fx.pool, Role::Viewer, "Vera").await,
        Role::Viewer,
    );

    let conversation = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();

    let owner = messaging
        .directory
        .check_access(conversation.id, &fx.client)
        .await
        .unwrap();
    let staff = messaging
        .directory
        .check_access(conversation.id, &viewer)
        .await
        .unwrap();
    let foreign = messaging
        .directory
        .check_access(conversation.id, &other)
        .await
        .unwrap();
    let missing = messaging
        .directory
        .check_access(Uuid::new_v4(), &other)
        .await
        .unwrap();

    assert_eq!(owner.map(|c| c.id), Some(conversation.id));
    assert_eq!(staff.map(|c| c.id), Some(conversation.id));
    assert!(foreign.is_none());
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_messages_listed_in_order_with_read_state() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());
    let conversation = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();

    for (author, body) in [
        (fx.client.user_id, "first"),
        (fx.admin.user_id, "second"),
        (fx.client.user_id, "third"),
    ] {
        messaging
            .store
            .append_message(conversation.id, author, body.to_owned())
            .await
            .unwrap();
    }

    let listed = messaging
        .store
        .list_messages(conversation.id, fx.admin.user_id)
        .await
        .unwrap();

    let bodies: Vec<&str> = listed.iter().map(|m| m.message.body.as_str()).collect();
    assert_eq!(bodies, ["first", "second", "third"]);
    assert_eq!(listed[1].message.author_name.as_deref(), Some("Ada"));

    // Own messages count as read
    let read: Vec<bool> = listed.iter().map(|m| m.read).collect();
    assert_eq!(read, [false, true, false]);
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());
    let conversation = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();

    for body in ["hello", "are you there?"] {
        messaging
            .store
            .append_message(conversation.id, fx.client.user_id, body.to_owned())
            .await
            .unwrap();
    }
    messaging
        .store
        .append_message(conversation.id, fx.editor.user_id, "yes".to_owned())
        .await
        .unwrap();

    let first = messaging
        .store
        .mark_read(conversation.id, fx.editor.user_id)
        .await
        .unwrap();
    let second = messaging
        .store
        .mark_read(conversation.id, fx.editor.user_id)
        .await
        .unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);

    let listed = messaging
        .store
        .list_messages(conversation.id, fx.editor.user_id)
        .await
        .unwrap();
    assert!(listed.iter().all(|m| m.read));

    // Read state is per user
    let unread_for_admin = messaging.unread.unread_count(&fx.admin).await.unwrap();
    assert_eq!(unread_for_admin, 3);
}

#[tokio::test]
async fn test_unread_count_tracks_new_messages() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());
    let conversation = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();

    assert_eq!(messaging.unread.unread_count(&fx.client).await.unwrap(), 0);

    messaging
        .store
        .append_message(conversation.id, fx.admin.user_id, "draft ready".to_owned())
        .await
        .unwrap();
    assert_eq!(messaging.unread.unread_count(&fx.client).await.unwrap(), 1);

    // Own messages never count
    messaging
        .store
        .append_message(conversation.id, fx.client.user_id, "thanks".to_owned())
        .await
        .unwrap();
    assert_eq!(messaging.unread.unread_count(&fx.client).await.unwrap(), 1);

    messaging
        .store
        .mark_read(conversation.id, fx.client.user_id)
        .await
        .unwrap();
    assert_eq!(messaging.unread.unread_count(&fx.client).await.unwrap(), 0);

    messaging
        .store
        .append_message(conversation.id, fx.editor.user_id, "one more".to_owned())
        .await
        .unwrap();
    assert_eq!(messaging.unread.unread_count(&fx.client).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unread_count_is_scoped_for_clients() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());
    let other = Session::new(
        insert_user(&fx.pool, Role::Client, "Cato").await,
        Role::Client,
    );
    let other_project = insert_project(&fx.pool, other.user_id, "Shop").await;

    let mine = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();
    let theirs = messaging
        .directory
        .get_or_create_conversation(&other, other_project)
        .await
        .unwrap();

    messaging
        .store
        .append_message(mine.id, fx.admin.user_id, "for Cleo".to_owned())
        .await
        .unwrap();
    messaging
        .store
        .append_message(theirs.id, fx.admin.user_id, "for Cato".to_owned())
        .await
        .unwrap();
    messaging
        .store
        .append_message(theirs.id, other.user_id, "from Cato".to_owned())
        .await
        .unwrap();

    assert_eq!(messaging.unread.unread_count(&fx.client).await.unwrap(), 1);
    assert_eq!(messaging.unread.unread_count(&other).await.unwrap(), 1);
    assert_eq!(messaging.unread.unread_count(&fx.editor).await.unwrap(), 3);
    assert_eq!(messaging.unread.unread_count(&fx.admin).await.unwrap(), 1);
}

#[tokio::test]
async fn test_append_validates_body() {
    let fx = fixture().await;
    let messaging = messaging(
        &fx.pool,
        AppConfig {
            message_max_length: 10,
            ..AppConfig::default()
        },
    );
    let conversation = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();

    let blank = messaging
        .store
        .append_message(conversation.id, fx.client.user_id, "   \n ".to_owned())
        .await
        .unwrap_err();
    assert!(matches!(blank, ServiceError::Validation(_)));

    let too_long = messaging
        .store
        .append_message(conversation.id, fx.client.user_id, "x".repeat(11))
        .await
        .unwrap_err();
    assert!(matches!(too_long, ServiceError::Validation(_)));

    let at_limit = messaging
        .store
        .append_message(conversation.id, fx.client.user_id, format!("  {}  ", "é".repeat(10)))
        .await
        .unwrap();
    assert_eq!(at_limit.body, "é".repeat(10));
}

#[tokio::test]
async fn test_append_to_missing_conversation() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());

    let err = messaging
        .store
        .append_message(Uuid::new_v4(), fx.admin.user_id, "hello".to_owned())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound("conversation")));
}

#[tokio::test]
async fn test_list_conversations_for_user() {
    let fx = fixture().await;
    let messaging = messaging(&fx.pool, AppConfig::default());
    let other = Session::new(
        insert_user(&fx.pool, Role::Client, "Cato").await,
        Role::Client,
    );
    let other_project = insert_project(&fx.pool, other.user_id, "Shop").await;

    let mine = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();
    let theirs = messaging
        .directory
        .get_or_create_conversation(&other, other_project)
        .await
        .unwrap();

    // The latest activity moves a conversation to the top
    messaging
        .store
        .append_message(mine.id, fx.admin.user_id, "latest".to_owned())
        .await
        .unwrap();

    let staff_view = messaging
        .directory
        .list_conversations_for_user(&fx.admin)
        .await
        .unwrap();
    let ids: Vec<Uuid> = staff_view.iter().map(|c| c.id).collect();
    assert_eq!(ids, [mine.id, theirs.id]);

    let client_view = messaging
        .directory
        .list_conversations_for_user(&fx.client)
        .await
        .unwrap();
    assert_eq!(client_view.len(), 1);

    let summary = &client_view[0];
    assert_eq!(summary.id, mine.id);
    assert_eq!(summary.project_name, "Website");
    assert_eq!(summary.client_name, "Cleo");
    assert_eq!(summary.last_message_body.as_deref(), Some("latest"));
    assert_eq!(summary.unread_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mark_read_alongside_concurrent_appends() {
    let (pool, path) = file_pool(5).await;
    let fx = fixture_on(pool.clone()).await;
    let messaging = messaging(&fx.pool, AppConfig::default());

    let conversation = messaging
        .directory
        .get_or_create_conversation(&fx.client, fx.project_id)
        .await
        .unwrap();

    let appends = (0..20).map(|i| {
        messaging
            .store
            .append_message(conversation.id, fx.client.user_id, format!("update {i}"))
    });
    let reads = (0..20).map(|_| messaging.store.mark_read(conversation.id, fx.editor.user_id));
    let (appended, marked) = tokio::join!(
        futures_util::future::join_all(appends),
        futures_util::future::join_all(reads),
    );

    let failed: Vec<_> = appended
        .iter()
        .filter_map(|result| result.as_ref().err().map(ToString::to_string))
        .chain(
            marked
                .iter()
                .filter_map(|result| result.as_ref().err().map(ToString::to_string)),
        )
        .collect();
    assert!(failed.is_empty(), "{failed:?}");

    // Every message is counted by exactly one mark_read
    let counted: u64 = marked.iter().map(|result| *result.as_ref().unwrap()).sum();
    let rest = messaging
        .store
        .mark_read(conversation.id, fx.editor.user_id)
        .await
        .unwrap();
    assert_eq!(counted + rest, 20);
    assert_eq!(messaging.unread.unread_count(&fx.editor).await.unwrap(), 0);

    drop(messaging);
    remove_file_db(pool, path).await;
}
