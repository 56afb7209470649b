use eyre::Result;
use ticket_vend_core::RequestMethod;
use ticket_vend_tests::TestCtxBuilder;
use util::{assert_counter, vend_n};

mod util;

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_set_then_peek_and_vend() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;

    ctx.api.set("foo", 300).await?.result?;
    assert_counter(&ctx.api, "foo", 300).await?;

    ctx.api.set("foo2", 300).await?.result?;
    assert_eq!(vend_n(&ctx.api, "foo2", 2).await?, vec![301, 302]);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_set_may_lower_counter() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;

    assert_eq!(vend_n(&ctx.api, "job", 10).await?.last(), Some(&10));
    ctx.api.set("job", 3).await?.result?;
    assert_eq!(
        ctx.api.vend("job").await?.result?,
        4,
        "After a set, vending must continue from the new baseline."
    );

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_peek_is_side_effect_free() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;

    assert_counter(&ctx.api, "fresh", 0).await?;
    assert!(
        !ctx.storage_path().exists(),
        "Peeking must not write the storage file."
    );

    assert_eq!(ctx.api.vend("fresh").await?.result?, 1);
    for _ in 0..5 {
        assert_counter(&ctx.api, "fresh", 1).await?;
    }
    assert_eq!(ctx.api.vend("fresh").await?.result?, 2);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_set_survives_reopen() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.set("bar", 40).await?.result?;

    let ctx = ctx.reopen().await?;
    assert_counter(&ctx.api, "bar", 40).await?;
    assert_eq!(ctx.api.vend("bar").await?.result?, 41);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_malformed_set_body_is_rejected() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.set("bar", 40).await?.result?;

    for body in ["", "forty", "-1", "4.0", "40 41", "99999999999999999999"] {
        let response = ctx
            .api
            .send(RequestMethod::Post, "/vend/bar", Some(body))
            .await?;
        assert_eq!(response.status, 400, "Body {body:?} must be rejected.");
        assert!(response.result.is_err());
    }
    assert_counter(&ctx.api, "bar", 40).await?;

    ctx.finish().await;
    Ok(())
}
