//! Basic example - build a small page, bind a listener, and talk to an
//! in-memory backend

use std::sync::Arc;

use edom::{Animation, Edom, Event, EventHandler, MemoryTransport, WindowConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let transport = Arc::new(MemoryTransport::new());
    transport
        .respond("http://demo.local/greeting", 200, "hello from the backend")
        .respond("http://demo.local/items.json", 200, r#"[{"id":1},{"id":2}]"#)
        .respond("http://demo.local/save", 201, r#"{"saved":true}"#);

    let config = WindowConfig {
        base_url: Some("http://demo.local/".to_string()),
        ..Default::default()
    };
    let edom = Edom::with_transport(config, transport.clone());
    let body = edom.body().ok_or("document has no body")?;

    // Build a list
    let list = edom.create("ul")?;
    edom.add_attr(list, [("id", "items"), ("role", "list")])?;
    edom.append(list, body)?;

    let item = edom.create("li")?;
    edom.write(item, "item")?;
    edom.add_class(item, ["item", "fresh"])?;
    edom.append(item, list)?;
    edom.multiply(item, 2)?;
    println!("List: {}", edom.outer_html(list)?);

    // Style
    edom.add_css(list, [("backgroundColor", "#eee"), ("padding", "4px")])?;
    edom.rotate(list, 3)?;
    edom.apply_animation(list, &Animation::new("fade", "1s", "ease-out"))?;
    println!("Inline style: {:?}", edom.attr(list, "style")?);
    println!("Computed display: {}", edom.get_computed_css(list, "display")?);

    // Events bubble from an item to the list
    let clicks = EventHandler::new(|event: &Event| {
        println!("click on node {} seen at {}", event.target(), event.current_target());
    });
    edom.add_event("#items", "click", &clicks)?;
    if let Some(first) = edom.select("li.item")? {
        edom.dispatch(first, "click")?;
    }

    // Network helpers
    edom.ajax_get("greeting", |text| println!("GET: {}", text)).await?;
    edom.ajax_post(
        "save",
        "demo-token",
        &json!({ "items": 3 }),
        |response| println!("POST: {} {}", response.status, response.response_text),
        |error| println!("POST failed: {}", error),
    )
    .await?;
    println!("fetch: {:?}", edom.fetch_get("items.json").await);

    // Forms
    edom.set_html(
        body,
        "<form id='signup'><input name='email' value='a@b.c'><input name='plan' value='pro'></form>",
    )?;
    let form = edom.find("signup").ok_or("form missing")?;
    println!("Form: {:?}", edom.serialize_form(form)?);

    println!("Requests sent: {}", transport.requests().len());
    Ok(())
}
