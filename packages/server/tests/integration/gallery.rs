use crate::common::{TestApp, png_bytes, routes};

mod browsing {
    use super::*;

    #[tokio::test]
    async fn anonymous_visitor_sees_gallery_in_upload_order() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        app.upload_image(&alice, "first.png", png_bytes(4, 4)).await;
        app.upload_image(&alice, "second.png", png_bytes(4, 4)).await;

        let res = app.get(&app.client, routes::INDEX).await;

        assert_eq!(res.status, 200);
        assert!(res.body["current_user"].is_null());
        let images = res.body["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0]["filename"], "first.png");
        assert_eq!(images[1]["filename"], "second.png");
        assert_eq!(images[0]["url"], "/uploads/first.png");
        assert_eq!(images[0]["owner"]["username"], "alice");
    }

    #[tokio::test]
    async fn empty_gallery_is_an_empty_list() {
        let app = TestApp::spawn().await;

        let res = app.get(&app.client, routes::INDEX).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["images"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn anonymous_visitor_sees_image_detail() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        let res = app.get(&app.client, &routes::image(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["image"]["id"], id);
        assert_eq!(res.body["is_owner"], false);
        assert_eq!(res.body["comments"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn owner_is_flagged_on_detail() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        let res = app.get(&alice, &routes::image(id)).await;

        assert_eq!(res.body["is_owner"], true);
    }

    #[tokio::test]
    async fn missing_image_is_404() {
        let app = TestApp::spawn().await;

        let res = app.get(&app.client, &routes::image(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod comments {
    use super::*;

    #[tokio::test]
    async fn logged_in_user_can_comment() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let bob = app.login_as("bob").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        let res = app
            .post_form(&bob, &routes::image(id), &[("comment", "Lovely colours")])
            .await;

        let body = res.assert_redirect(&routes::image(id));
        assert_eq!(body["status"], "success");

        let detail = app.get(&app.client, &routes::image(id)).await;
        let comments = detail.body["comments"].as_array().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0]["text"], "Lovely colours");
        assert_eq!(comments[0]["author"]["username"], "bob");
    }

    #[tokio::test]
    async fn anonymous_comment_redirects_to_login_and_stores_nothing() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        let res = app
            .post_form(&app.client, &routes::image(id), &[("comment", "hi")])
            .await;

        let body = res.assert_redirect("/login");
        assert_eq!(body["status"], "failure");
        assert_eq!(body["level"], "warning");
        assert_eq!(app.comment_count().await, 0);
    }

    #[tokio::test]
    async fn anonymous_bodyless_comment_still_redirects_to_login() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        let res = app.post_empty(&app.client, &routes::image(id)).await;

        let body = res.assert_redirect("/login");
        assert_eq!(body["status"], "failure");
        assert_eq!(app.comment_count().await, 0);
    }

    #[tokio::test]
    async fn bodyless_comment_from_member_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        let res = app.post_empty(&alice, &routes::image(id)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.comment_count().await, 0);
    }

    #[tokio::test]
    async fn empty_comment_is_refused() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        for text in ["", "   "] {
            let res = app
                .post_form(&alice, &routes::image(id), &[("comment", text)])
                .await;
            assert_eq!(res.assert_redirect(&routes::image(id))["status"], "failure");
        }

        let res = app.post_form(&alice, &routes::image(id), &[]).await;
        assert_eq!(res.body["status"], "failure");
        assert_eq!(app.comment_count().await, 0);
    }

    #[tokio::test]
    async fn overlong_comment_is_refused() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;
        let text = "a".repeat(301);

        let res = app
            .post_form(&alice, &routes::image(id), &[("comment", text.as_str())])
            .await;

        assert_eq!(res.body["status"], "failure");
        assert_eq!(app.comment_count().await, 0);
    }

    #[tokio::test]
    async fn comment_on_missing_image_is_404() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;

        let res = app
            .post_form(&alice, &routes::image(42), &[("comment", "hi")])
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(app.comment_count().await, 0);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn owner_deletes_image_file_and_comments() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let bob = app.login_as("bob").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;
        app.post_form(&bob, &routes::image(id), &[("comment", "nice")])
            .await;
        assert_eq!(app.comment_count().await, 1);

        let res = app.post_form(&alice, &routes::delete(id), &[]).await;

        let body = res.assert_redirect("/");
        assert_eq!(body["status"], "success");
        assert_eq!(body["level"], "info");
        assert_eq!(app.image_count().await, 0);
        assert_eq!(app.comment_count().await, 0);
        assert!(!app.upload_dir.join("cat.png").exists());
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let bob = app.login_as("bob").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        let res = app.post_form(&bob, &routes::delete(id), &[]).await;

        let body = res.assert_redirect("/");
        assert_eq!(body["status"], "failure");
        assert_eq!(body["level"], "danger");
        assert_eq!(app.image_count().await, 1);
        assert!(app.upload_dir.join("cat.png").exists());
    }

    #[tokio::test]
    async fn delete_succeeds_when_file_is_already_gone() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;
        std::fs::remove_file(app.upload_dir.join("cat.png")).unwrap();

        let res = app.post_form(&alice, &routes::delete(id), &[]).await;

        assert_eq!(res.assert_redirect("/")["status"], "success");
        assert_eq!(app.image_count().await, 0);
    }

    #[tokio::test]
    async fn deleting_missing_image_is_404() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;

        let res = app.post_form(&alice, &routes::delete(7), &[]).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn anonymous_delete_redirects_to_login() {
        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;
        let id = app.upload_image(&alice, "cat.png", png_bytes(4, 4)).await;

        let res = app.post_form(&app.client, &routes::delete(id), &[]).await;

        res.assert_redirect("/login");
        assert_eq!(app.image_count().await, 1);
    }
}
