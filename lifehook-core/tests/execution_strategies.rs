// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Async execution strategies and end-to-end wiring.

use lifehook_core::{
    register_builtin_hooks, AsyncHook, BaseHook, FnHook, HookBuilder, HookChain, HookContext,
    HookError, HookEvent, HookRegistry, PathFilterBuilder, RegistryConfig, RequestInfo,
    SharedHook, TracingLogger,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn sleeper(name: &str, millis: u64) -> SharedHook {
    Arc::new(FnHook::new(name, vec![HookEvent::RequestStart], move |_| {
        std::thread::sleep(Duration::from_millis(millis));
        Ok(())
    }))
}

fn request_start() -> HookContext {
    HookContext::new(HookEvent::RequestStart, "it")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parallel_is_faster_than_sequential() {
    let registry = HookRegistry::new();
    let hooks = vec![sleeper("a", 50), sleeper("b", 50)];

    let started = Instant::now();
    registry
        .execute_parallel(hooks.clone(), Arc::new(request_start()))
        .await
        .unwrap();
    let parallel = started.elapsed();

    let started = Instant::now();
    registry.execute_sequential(&hooks, &request_start()).unwrap();
    let sequential = started.elapsed();

    assert!(parallel < Duration::from_millis(90), "parallel took {parallel:?}");
    assert!(sequential >= Duration::from_millis(100));
}

#[tokio::test]
async fn timeout_message_embeds_duration() {
    let registry = HookRegistry::new();
    let err = registry
        .execute_with_timeout(vec![sleeper("slow", 50)], Arc::new(request_start()), Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("10ms"), "{err}");
}

#[tokio::test]
async fn timeout_cancels_hooks_not_yet_started() {
    let registry = HookRegistry::new();
    let late_calls = Arc::new(AtomicUsize::new(0));
    let counter = late_calls.clone();
    let late: SharedHook = Arc::new(FnHook::new("late", vec![HookEvent::RequestStart], move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let ctx = Arc::new(request_start());
    let result = registry
        .execute_with_timeout(vec![sleeper("slow", 60), late], ctx.clone(), Duration::from_millis(10))
        .await;
    assert!(matches!(result, Err(HookError::Timeout(_))));

    // let the abandoned task observe the cancellation
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    assert!(!ctx.is_cancelled());
}

#[tokio::test]
async fn retry_counts_attempts() {
    let registry = HookRegistry::with_config(RegistryConfig {
        retry_backoff_ms: 2,
        ..RegistryConfig::default()
    });

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let flaky: SharedHook = Arc::new(FnHook::new("flaky", vec![HookEvent::RequestStart], move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(HookError::msg("transient"))
        } else {
            Ok(())
        }
    }));
    registry
        .execute_with_retry(&[flaky], &request_start(), 3)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let broken: SharedHook = Arc::new(FnHook::new("broken", vec![HookEvent::RequestStart], move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(HookError::msg("permanent"))
    }));
    let err = registry
        .execute_with_retry(&[broken], &request_start(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, HookError::RetryExhausted { attempts: 2, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn async_hook_fire_and_forget() {
    let hook = Arc::new(
        AsyncHook::new(BaseHook::new("bg", vec![HookEvent::RequestEnd], |ctx| {
            ctx.set_metadata("background", true);
            Ok(())
        }))
        .with_buffer_size(16),
    );
    let ctx = Arc::new(HookContext::new(HookEvent::RequestEnd, "it"));

    hook.clone().execute_async(ctx.clone()).await.unwrap().unwrap();
    assert!(ctx.has_metadata("background"));
}

#[tokio::test(flavor = "multi_thread")]
async fn builtins_config_and_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lifehook.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
        shutdown_grace_ms = 1000

        [builtin]
        lifecycle = false

        [[overrides]]
        name = "builtin.logging"
        enabled = false
        "#
    )
    .unwrap();

    let config = RegistryConfig::from_file(&path).unwrap();
    let registry = HookRegistry::with_config(config.clone());
    register_builtin_hooks(&registry, &config.builtin, Arc::new(TracingLogger)).unwrap();
    assert_eq!(registry.apply_overrides(), 1);
    assert!(!registry.get_hook("builtin.logging").unwrap().is_enabled());
    assert!(registry.get_hook("builtin.lifecycle").is_none());

    let ctx = Arc::new(HookContext::new(HookEvent::RequestError, "it").with_error("upstream reset"));
    registry.execute_async(ctx.clone()).await.unwrap().unwrap();
    assert_eq!(ctx.metadata("error_tracked"), Some(serde_json::json!(true)));

    registry.shutdown(config.shutdown_grace()).await.unwrap();
    assert_eq!(registry.hook_count(), 0);
}

#[test]
fn builder_hooks_in_registry_and_chain() {
    let static_paths = PathFilterBuilder::new()
        .exclude_prefix("/static/")
        .exclude("/health")
        .build();
    let audited = Arc::new(AtomicUsize::new(0));
    let counter = audited.clone();

    let audit: SharedHook = Arc::new(
        HookBuilder::new()
            .name("audit")
            .event(HookEvent::RequestEnd)
            .path_filter(move |p: &str| static_paths(p))
            .condition(|ctx| ctx.status_code.map_or(false, |s| s < 500))
            .execute(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap(),
    );

    let registry = HookRegistry::new();
    registry.register(audit.clone()).unwrap();

    let end = |path: &str, status: u16| {
        HookContext::new(HookEvent::RequestEnd, "it")
            .with_request(RequestInfo::new("GET", path))
            .with_status(status)
    };
    registry.execute(&end("/users", 200)).unwrap();
    registry.execute(&end("/static/app.js", 200)).unwrap();
    registry.execute(&end("/health", 200)).unwrap();
    registry.execute(&end("/users", 503)).unwrap();
    assert_eq!(audited.load(Ordering::SeqCst), 1);

    let chain = HookChain::new().add(audit).add(Arc::new(FnHook::new(
        "tail",
        vec![HookEvent::RequestEnd],
        |_| Err(HookError::msg("tail failed")),
    )));
    let err = chain.execute(&end("/orders", 201)).unwrap_err();
    assert_eq!(err.to_string(), "tail failed");
    assert_eq!(audited.load(Ordering::SeqCst), 2);
}
