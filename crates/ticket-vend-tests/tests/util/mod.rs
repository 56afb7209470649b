use eyre::Result;
use ticket_vend_tests::Api;

/// Vends `n` tickets for `key` one after another and returns them in order.
#[allow(unused)]
pub async fn vend_n(api: &Api, key: &str, n: usize) -> Result<Vec<u64>> {
    let mut tickets = Vec::with_capacity(n);
    for _ in 0..n {
        tickets.push(api.vend(key).await?.result?);
    }
    Ok(tickets)
}

/// Peeks at `key` and checks the counter holds `expected`.
#[allow(unused)]
pub async fn assert_counter(api: &Api, key: &str, expected: u64) -> Result<()> {
    assert_eq!(
        api.peek(key).await?.result?,
        expected,
        "The counter of {key:?} must be {expected}."
    );
    Ok(())
}
