use crate::{
    api::{attendance, breaks, leave_request, reservation, shift},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let api_limiter = build_limiter(config.rate_api_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter) // rate limiting
            .service(
                web::scope("/shifts")
                    // /shifts
                    .service(
                        web::resource("")
                            .route(web::post().to(shift::create_shift))
                            .route(web::get().to(shift::list_shifts)),
                    )
                    // lifecycle actions; registered before /{id} so the
                    // literal segments win the match
                    .service(web::resource("/start").route(web::post().to(shift::start_shift)))
                    .service(web::resource("/end").route(web::post().to(shift::end_shift)))
                    .service(web::resource("/auto-end").route(web::post().to(shift::auto_end)))
                    // /shifts/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(shift::get_shift))
                            .route(web::put().to(shift::update_shift))
                            .route(web::delete().to(shift::delete_shift)),
                    ),
            )
            .service(
                web::scope("/breaks")
                    .service(web::resource("/start").route(web::post().to(breaks::start_break)))
                    .service(web::resource("/{id}/end").route(web::post().to(breaks::end_break))),
            )
            .service(
                web::scope("/attendance").service(
                    web::resource("/calendar").route(web::get().to(attendance::calendar)),
                ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // approved leaves feeding the attendance calendar
                    .service(
                        web::resource("/approved")
                            .route(web::get().to(leave_request::approved_leaves)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::delete().to(leave_request::delete_leave)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/reservations")
                    // /reservations
                    .service(
                        web::resource("")
                            .route(web::post().to(reservation::create_reservation))
                            .route(web::get().to(reservation::list_reservations)),
                    )
                    // /reservations/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(reservation::get_reservation))
                            .route(web::put().to(reservation::update_reservation))
                            .route(web::delete().to(reservation::delete_reservation)),
                    ),
            ),
    );
}
