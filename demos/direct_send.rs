/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::time::Duration;

use mail_direct::{DeliveryRequest, DirectTransport};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Build a simple multipart message with a single attachment
    let request = DeliveryRequest::new("john@example.com", "jane@example.org")
        .unwrap()
        .from_name("John Doe")
        .subject("Howdy!")
        .text_body("These pretzels are making me thirsty.")
        .html_body("<p>These pretzels are making me <b>thirsty</b>.</p>")
        .attachment("image/png", "pretzels.png", [1u8, 2, 3, 4].as_ref())
        .timeout(Duration::from_secs(10));

    // Look up the MX records of example.org and hand the message over
    // directly, upgrading to TLS whenever the exchanger supports it.
    let outcome = DirectTransport::new()
        .unwrap()
        .allow_invalid_certs(true)
        .send(&request)
        .await;

    match outcome.error {
        None => println!("Delivered."),
        Some(err) => eprintln!("Delivery failed: {err}"),
    }
}
