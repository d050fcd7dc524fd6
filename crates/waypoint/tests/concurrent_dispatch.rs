//! Tests for sharing one compiled table across tasks and threads.

mod common;
use common::*;

use std::sync::Arc;

use futures::future::join_all;
use waypoint::{CompiledRouteTable, UrlArgs};

fn blog() -> Arc<CompiledRouteTable<()>> {
    Arc::new(compile(route_set(&[
        ("home", "/"),
        ("posts", "/posts"),
        ("post", "/posts/{id>\\d+}"),
        ("page", "/{page>.*}"),
    ])))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dispatch_from_many_tasks() {
    let table = blog();

    let tasks = (0..64).map(|i| {
        let table = Arc::clone(&table);
        tokio::spawn(async move {
            let path = format!("/posts/{i}");
            let found = table.dispatch(&(), &path).unwrap().unwrap();
            (found.route.name().to_string(), found.params.get("id").map(str::to_string))
        })
    });

    for (i, result) in join_all(tasks).await.into_iter().enumerate() {
        let (name, id) = result.unwrap();
        assert_eq!(name, "post");
        assert_eq!(id, Some(i.to_string()));
    }
}

#[tokio::test]
async fn build_urls_from_many_tasks() {
    let table = blog();

    let tasks = (0..16).map(|i| {
        let table = Arc::clone(&table);
        tokio::spawn(async move { table.url_for("post", &UrlArgs::new().arg(i)).unwrap() })
    });

    let urls: Vec<String> = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let expected: Vec<String> = (0..16).map(|i| format!("/posts/{i}")).collect();
    assert_eq!(urls, expected);
}

#[test]
fn dispatch_from_threads() {
    let table = blog();

    let handles: Vec<_> = ["/", "/posts", "/posts/7", "/about/team"]
        .into_iter()
        .map(|path| {
            let table = Arc::clone(&table);
            std::thread::spawn(move || {
                table
                    .dispatch(&(), path)
                    .unwrap()
                    .map(|found| found.route.name().to_string())
            })
        })
        .collect();

    let names: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            Some("home".to_string()),
            Some("posts".to_string()),
            Some("post".to_string()),
            Some("page".to_string()),
        ]
    );
}
