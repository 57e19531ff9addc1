//! API integration tests
//!
//! These run against a live server with a fresh database:
//!   cargo run &
//!   cargo test -- --ignored
//!
//! The `librarian` fixture user (password `librarian-password`) is expected
//! to exist with all three capabilities granted:
//!   INSERT INTO user_capabilities (user_id, capability)
//!   SELECT id, c FROM users, (VALUES ('can_mark_returned'),
//!     ('can_edit_book'), ('can_delete_book')) AS caps(c)
//!   WHERE username = 'librarian';

use chrono::{Duration, Utc};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

/// Client that reports redirects instead of following them
fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Log in as the librarian fixture and return a bearer token
async fn librarian_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/accounts/login", BASE_URL))
        .json(&json!({
            "username": "librarian",
            "password": "librarian-password"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a throwaway patron; returns the register response
/// (token plus the created user)
async fn register_patron(client: &Client) -> Value {
    let username = format!("patron-{}", uuid::Uuid::new_v4());
    let response = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "patron-password"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), StatusCode::CREATED);

    response.json().await.expect("Failed to parse register response")
}

/// Register a throwaway patron and return their token
async fn patron_token(client: &Client) -> String {
    let body = register_patron(client).await;
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/accounts/login", BASE_URL))
        .json(&json!({
            "username": "librarian",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_register_then_login() {
    let client = client();
    let username = format!("patron-{}", uuid::Uuid::new_v4());

    let response = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "patron-password",
            "first_name": "Pat",
            "last_name": "Ron"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["username"], username.as_str());

    // Same username again is a conflict
    let response = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "patron-password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // And the fresh account can log in
    let response = client
        .post(format!("{}/accounts/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "patron-password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_visit_counter_cookie() {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    let response = client
        .get(format!("{}/catalog", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["num_visits"], 0);

    // The cookie travels back, so the second visit reports 1
    let response = client
        .get(format!("{}/catalog", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["num_visits"], 1);
}

#[tokio::test]
#[ignore]
async fn test_author_list_pagination() {
    let client = client();
    let token = librarian_token(&client).await;

    // Ensure enough authors exist for at least two pages
    for i in 0..6 {
        client
            .post(format!("{}/catalog/authors", BASE_URL))
            .bearer_auth(&token)
            .json(&json!({
                "first_name": format!("First{}", i),
                "last_name": format!("Last{}", i)
            }))
            .send()
            .await
            .expect("Failed to create author");
    }

    let response = client
        .get(format!("{}/catalog/authors?page=1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["per_page"], 5);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["is_paginated"], true);

    // Way past the end is a not-found outcome
    let response = client
        .get(format!("{}/catalog/authors?page=9999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_anonymous_renewal_redirects_to_login() {
    let instance_id = uuid::Uuid::new_v4();
    let response = client()
        .get(format!("{}/catalog/book/{}/renew", BASE_URL, instance_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("No Location header");
    assert!(location.starts_with("/accounts/login?next="));
    // The next value is percent-encoded path-and-query
    assert!(location.contains("%2Frenew"));
}

#[tokio::test]
#[ignore]
async fn test_patron_cannot_renew() {
    let client = client();
    let token = patron_token(&client).await;

    let instance_id = uuid::Uuid::new_v4();
    let response = client
        .get(format!("{}/catalog/book/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Full renewal flow: the librarian creates a book with a copy on loan to a
/// patron, pulls the renewal form, then renews with the default date.
#[tokio::test]
#[ignore]
async fn test_renewal_flow() {
    let client = client();
    let token = librarian_token(&client).await;

    let response = client
        .post(format!("{}/catalog/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "The Name of the Wind",
            "summary": "A hero recounts his youth.",
            "isbn": format!("{:013}", rand_isbn())
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse book");

    let due = (Utc::now().date_naive() + Duration::days(5)).to_string();
    let response = client
        .post(format!("{}/catalog/bookinstances", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "book_id": book["id"],
            "imprint": "London : Gollancz, 2014.",
            "status": "on_loan",
            "due_back": due
        }))
        .send()
        .await
        .expect("Failed to create instance");
    assert_eq!(response.status(), StatusCode::CREATED);
    let instance: Value = response.json().await.expect("Failed to parse instance");
    let instance_id = instance["id"].as_str().unwrap();

    // Form defaults to three weeks out
    let response = client
        .get(format!("{}/catalog/book/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch form");
    assert!(response.status().is_success());
    let form: Value = response.json().await.expect("Failed to parse form");
    let default_date = (Utc::now().date_naive() + Duration::days(21)).to_string();
    assert_eq!(form["renewal_date"], default_date.as_str());

    // A date in the past is rejected with a field error, record unchanged
    let past = (Utc::now().date_naive() - Duration::days(7)).to_string();
    let response = client
        .post(format!("{}/catalog/book/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": past }))
        .send()
        .await
        .expect("Failed to post renewal");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert!(body["fields"]["renewal_date"].is_array());

    let response = client
        .get(format!("{}/catalog/bookinstance/{}", BASE_URL, instance_id))
        .send()
        .await
        .expect("Failed to fetch instance");
    let unchanged: Value = response.json().await.expect("Failed to parse instance");
    assert_eq!(unchanged["due_back"], due.as_str());

    // The default date succeeds and redirects to the all-borrowed listing
    let response = client
        .post(format!("{}/catalog/book/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": default_date }))
        .send()
        .await
        .expect("Failed to post renewal");
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/catalog/allborrowed"
    );

    let response = client
        .get(format!("{}/catalog/bookinstance/{}", BASE_URL, instance_id))
        .send()
        .await
        .expect("Failed to fetch instance");
    let renewed: Value = response.json().await.expect("Failed to parse instance");
    assert_eq!(renewed["due_back"], default_date.as_str());
    assert_eq!(renewed["status"], "on_loan");

    // Mark it returned: available again, no borrower, no due date
    let response = client
        .post(format!(
            "{}/catalog/bookinstance/{}/return",
            BASE_URL, instance_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to mark returned");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse instance");
    assert_eq!(returned["status"], "available");
    assert!(returned["due_back"].is_null());
    assert!(returned["borrower_id"].is_null());
}

/// Loan listings: a patron's own view holds exactly their on-loan copies,
/// soonest due first; the all-borrowed view contains them in the same
/// order; and the librarian can renew a copy borrowed by someone else.
#[tokio::test]
#[ignore]
async fn test_loan_listings_and_cross_user_renewal() {
    let client = client();
    let librarian = librarian_token(&client).await;

    let patron = register_patron(&client).await;
    let patron_token = patron["token"].as_str().unwrap().to_string();
    let patron_id = patron["user"]["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/catalog/books", BASE_URL))
        .bearer_auth(&librarian)
        .json(&json!({
            "title": "The Wise Man's Fear",
            "summary": "The story continues.",
            "isbn": format!("{:013}", rand_isbn())
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse book");

    // Two copies on loan to the patron, the later-due one created first
    let today = Utc::now().date_naive();
    let due_far = (today + Duration::days(9)).to_string();
    let due_soon = (today + Duration::days(3)).to_string();

    let mut ids = Vec::new();
    for due in [&due_far, &due_soon] {
        let response = client
            .post(format!("{}/catalog/bookinstances", BASE_URL))
            .bearer_auth(&librarian)
            .json(&json!({
                "book_id": book["id"],
                "imprint": "London : Gollancz, 2011.",
                "status": "on_loan",
                "due_back": due,
                "borrower_id": patron_id
            }))
            .send()
            .await
            .expect("Failed to create instance");
        assert_eq!(response.status(), StatusCode::CREATED);
        let instance: Value = response.json().await.expect("Failed to parse instance");
        ids.push(instance["id"].as_str().unwrap().to_string());
    }
    let (far_id, soon_id) = (ids[0].clone(), ids[1].clone());

    // The patron sees exactly their two loans, soonest due first
    let response = client
        .get(format!("{}/catalog/mybooks", BASE_URL))
        .bearer_auth(&patron_token)
        .send()
        .await
        .expect("Failed to fetch mybooks");
    assert!(response.status().is_success());
    let page: Value = response.json().await.expect("Failed to parse mybooks");
    assert_eq!(page["total"], 2);
    assert_eq!(page["per_page"], 3);

    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], soon_id.as_str());
    assert_eq!(items[1]["id"], far_id.as_str());
    for item in items {
        assert_eq!(item["borrower_id"].as_i64(), Some(patron_id));
        assert_eq!(item["status"], "on_loan");
    }

    // The all-borrowed view holds every loan, same ordering; walk its
    // pages and check the patron's copies appear in due-back order
    let mut seen = Vec::new();
    let mut last_due = String::new();
    let mut seen_undated = false;
    let mut page_number = 1;
    loop {
        let response = client
            .get(format!(
                "{}/catalog/allborrowed?page={}",
                BASE_URL, page_number
            ))
            .bearer_auth(&librarian)
            .send()
            .await
            .expect("Failed to fetch allborrowed");
        assert!(response.status().is_success());
        let page: Value = response.json().await.expect("Failed to parse allborrowed");

        for item in page["items"].as_array().unwrap() {
            match item["due_back"].as_str() {
                Some(due) => {
                    assert!(!seen_undated, "dated loans must precede undated ones");
                    assert!(due >= last_due.as_str(), "loans not sorted by due date");
                    last_due = due.to_string();
                }
                None => seen_undated = true,
            }
            seen.push(item["id"].as_str().unwrap().to_string());
        }

        if page_number >= page["num_pages"].as_i64().unwrap() {
            break;
        }
        page_number += 1;
    }
    let soon_pos = seen.iter().position(|id| *id == soon_id).expect("soon copy missing");
    let far_pos = seen.iter().position(|id| *id == far_id).expect("far copy missing");
    assert!(soon_pos < far_pos);

    // The capability lets the librarian renew a copy they do not hold
    let default_date = (today + Duration::days(21)).to_string();
    let response = client
        .post(format!("{}/catalog/book/{}/renew", BASE_URL, far_id))
        .bearer_auth(&librarian)
        .json(&json!({ "renewal_date": default_date }))
        .send()
        .await
        .expect("Failed to post renewal");
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/catalog/allborrowed"
    );

    let response = client
        .get(format!("{}/catalog/bookinstance/{}", BASE_URL, far_id))
        .send()
        .await
        .expect("Failed to fetch instance");
    let renewed: Value = response.json().await.expect("Failed to parse instance");
    assert_eq!(renewed["due_back"], default_date.as_str());
    assert_eq!(renewed["borrower_id"].as_i64(), Some(patron_id));
}

#[tokio::test]
#[ignore]
async fn test_delete_author_with_books_is_refused() {
    let client = client();
    let token = librarian_token(&client).await;

    let response = client
        .post(format!("{}/catalog/authors", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "first_name": "Ursula", "last_name": "Le Guin" }))
        .send()
        .await
        .expect("Failed to create author");
    let author: Value = response.json().await.expect("Failed to parse author");

    let response = client
        .post(format!("{}/catalog/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "A Wizard of Earthsea",
            "author_id": author["id"],
            "summary": "Ged learns the cost of power.",
            "isbn": format!("{:013}", rand_isbn())
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .delete(format!("{}/catalog/author/{}", BASE_URL, author["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send delete");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_my_books_requires_login() {
    let response = client()
        .get(format!("{}/catalog/mybooks", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_redirection());
}

fn rand_isbn() -> u64 {
    // 13 digits from the random halves of a v4 UUID
    let id = uuid::Uuid::new_v4();
    (id.as_u128() % 10_000_000_000_000) as u64
}
