//! 数据访问层集成测试

mod common;

use chrono::Duration;

use linkhub::repository::{
    EmbedRecord, LinkRecord, ListFilter, SeaOrmSessionStore, SessionStore, SettingKey,
};

#[tokio::test]
async fn test_links_visible_only_and_ordered() {
    let env = common::setup().await;
    let links = &env.state.links;

    for (title, order, visible) in [("c", 2, true), ("a", 0, true), ("hidden", 1, false), ("b", 0, true)] {
        links
            .upsert(LinkRecord {
                title: title.to_string(),
                url: format!("https://{}.example", title),
                order_index: order,
                is_visible: visible,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let visible: Vec<String> = links
        .list(ListFilter::VisibleOnly)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.title)
        .collect();
    // order_index 相同时按 id
    assert_eq!(visible, vec!["a", "b", "c"]);

    let all = links.list(ListFilter::All).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[2].title, "hidden");
}

#[tokio::test]
async fn test_link_update_and_delete() {
    let env = common::setup().await;
    let links = &env.state.links;

    let id = links
        .upsert(LinkRecord {
            title: "Old".into(),
            url: "https://old.example".into(),
            is_visible: true,
            ..Default::default()
        })
        .await
        .unwrap()
        .expect("inserted id");

    let updated = links
        .upsert(LinkRecord {
            id: Some(id),
            title: "New".into(),
            url: "https://new.example".into(),
            color_hex: Some("#123456".into()),
            is_visible: false,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated, Some(id));

    let all = links.list(ListFilter::All).await.unwrap();
    let link = all.iter().find(|l| l.id == id).unwrap();
    assert_eq!(link.title, "New");
    assert_eq!(link.color_hex.as_deref(), Some("#123456"));
    assert!(!link.is_visible);

    // 更新不存在的 id 不会插入新行
    let missing = links
        .upsert(LinkRecord {
            id: Some(id + 100),
            title: "Ghost".into(),
            url: "https://ghost.example".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(missing, None);
    assert_eq!(links.list(ListFilter::All).await.unwrap().len(), 1);

    assert!(links.delete(id).await.unwrap());
    assert!(!links.delete(id).await.unwrap());
}

#[tokio::test]
async fn test_settings_allow_list_and_sanitizing() {
    let env = common::setup().await;
    let settings = &env.state.settings;

    // 默认值已写入
    assert_eq!(settings.get("site_title").await.unwrap().as_deref(), Some("LinkHub"));
    assert_eq!(
        settings.get("site_url").await.unwrap().as_deref(),
        Some("https://links.test")
    );

    assert!(!settings.set("admin_password", "x").await.unwrap());
    assert_eq!(settings.get("admin_password").await.unwrap(), None);

    assert!(
        settings
            .set("bio", r#"<p onclick="x()">Hi <a href="https://me.dev">me</a></p><script>bad()</script>"#)
            .await
            .unwrap()
    );
    let bio = settings.get("bio").await.unwrap().unwrap();
    assert!(bio.contains("Hi"));
    assert!(bio.contains(r#"rel="noopener noreferrer""#));
    assert!(!bio.contains("onclick"));
    assert!(!bio.contains("bad()"));

    settings.set_key(SettingKey::DisplayName, "  Ada  ").await.unwrap();
    assert_eq!(settings.get("display_name").await.unwrap().as_deref(), Some("Ada"));

    // 再次初始化不会覆盖已有值
    settings.set("site_title", "Mine").await.unwrap();
    settings.seed_defaults("links.test").await.unwrap();
    assert_eq!(settings.get("site_title").await.unwrap().as_deref(), Some("Mine"));
}

#[tokio::test]
async fn test_embeds_are_sanitized() {
    let env = common::setup().await;
    env.state
        .embeds
        .upsert(EmbedRecord {
            id: None,
            title: None,
            embed_html: r#"<iframe src="https://www.youtube.com/embed/abc" onload="x()"></iframe><img src=x onerror=alert(1)>"#.into(),
            order_index: 0,
            is_visible: true,
        })
        .await
        .unwrap();

    let embeds = env.state.embeds.list(ListFilter::VisibleOnly).await.unwrap();
    assert_eq!(embeds.len(), 1);
    assert!(embeds[0].embed_html.contains("youtube.com/embed/abc"));
    assert!(!embeds[0].embed_html.contains("onload"));
    assert!(!embeds[0].embed_html.contains("onerror"));
}

#[tokio::test]
async fn test_session_expiry() {
    let env = common::setup().await;
    let store = SeaOrmSessionStore::new(env.db.clone());
    let admin = env
        .state
        .auth
        .login(common::ADMIN_USERNAME, common::ADMIN_PASSWORD, None)
        .await
        .unwrap()
        .expect("admin login");

    let live = store.create(admin.user_id, Duration::days(1)).await.unwrap();
    let expired = store.create(admin.user_id, Duration::seconds(-5)).await.unwrap();
    assert_ne!(live.csrf_token, expired.csrf_token);

    assert!(store.load(&live.id).await.unwrap().is_some());
    assert!(store.load(&expired.id).await.unwrap().is_none());

    store.destroy(&live.id).await.unwrap();
    assert!(store.load(&live.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_expired_sessions() {
    let env = common::setup().await;
    let store = SeaOrmSessionStore::new(env.db.clone());

    let session = env
        .state
        .auth
        .login(common::ADMIN_USERNAME, common::ADMIN_PASSWORD, None)
        .await
        .unwrap()
        .expect("admin login");

    store.create(session.user_id, Duration::seconds(-60)).await.unwrap();
    store.create(session.user_id, Duration::seconds(-30)).await.unwrap();

    assert_eq!(store.purge_expired().await.unwrap(), 2);
    assert!(store.load(&session.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_login_replaces_previous_session() {
    let env = common::setup().await;
    let auth = &env.state.auth;

    let first = auth
        .login(common::ADMIN_USERNAME, common::ADMIN_PASSWORD, None)
        .await
        .unwrap()
        .unwrap();
    let second = auth
        .login(common::ADMIN_USERNAME, common::ADMIN_PASSWORD, Some(&first.id))
        .await
        .unwrap()
        .unwrap();

    assert_ne!(first.id, second.id);
    assert!(auth.current_session(&first.id).await.unwrap().is_none());
    assert!(auth.current_session(&second.id).await.unwrap().is_some());

    assert!(auth.login(common::ADMIN_USERNAME, "nope", None).await.unwrap().is_none());
    assert!(auth.login("nobody", common::ADMIN_PASSWORD, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reset_password() {
    let env = common::setup().await;
    let auth = &env.state.auth;

    assert!(!auth.reset_password(common::ADMIN_USERNAME, "brand-new-pass").await.unwrap());
    assert!(auth.login(common::ADMIN_USERNAME, common::ADMIN_PASSWORD, None).await.unwrap().is_none());
    assert!(auth.login(common::ADMIN_USERNAME, "brand-new-pass", None).await.unwrap().is_some());

    assert!(auth.reset_password("second", "another-pass").await.unwrap());
    assert!(auth.reset_password("second", "").await.is_err());
}
