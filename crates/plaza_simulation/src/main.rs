//! Headless симуляция Plaza
//!
//! Скриптовая сессия без рендера и socket'а: пустой roster, спавн,
//! приземление, пробежка вперёд, прыжок, остановка. Печатает всё,
//! что клиент отправил бы на сервер.

use plaza_simulation::logger::log_info;
use plaza_simulation::{
    advance_ticks, create_headless_app, AnimationCatalog, Key, KeyboardEvent, NetworkInbox, NetworkOutbox,
    ServerMessage,
};

fn main() {
    let seed = 42;
    println!("Starting Plaza headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    // Реальные клипы грузит рендерер; здесь длины фиксированные
    app.insert_resource(AnimationCatalog::uniform(1.2));

    if let Err(err) = app
        .world_mut()
        .resource_mut::<NetworkInbox>()
        .push(&ServerMessage::UpdateCharactersData(Vec::new()))
    {
        eprintln!("failed to queue roster: {}", err);
        return;
    }

    // (тик, событие клавиатуры)
    let script = [
        (100, KeyboardEvent::pressed(Key::W)),
        (140, KeyboardEvent::pressed(Key::Space)),
        (141, KeyboardEvent::released(Key::Space)),
        (200, KeyboardEvent::released(Key::W)),
    ];

    let mut tick = 0;
    for (at, event) in script {
        advance_ticks(&mut app, at - tick);
        tick = at;
        flush(&mut app);
        app.world_mut().send_event(event);
    }
    advance_ticks(&mut app, 60);
    flush(&mut app);

    log_info("Simulation complete!");
}

fn flush(app: &mut bevy::prelude::App) {
    for raw in app.world_mut().resource_mut::<NetworkOutbox>().drain_encoded() {
        println!("{}", raw);
    }
}
