use crate::{
    api::{attendance, backfill, employee, identity, ingest, operations, overrides, sweeper, work_week},
    config::Config,
};
use actix_governor::{
    governor::middleware::NoOpMiddleware, Governor, GovernorConfig, GovernorConfigBuilder,
    PeerIpKeyExtractor,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let ingest_limiter = build_limiter(config.rate_ingest_per_min);
    let admin_limiter = build_limiter(config.rate_admin_per_min);
    let read_limiter = build_limiter(config.rate_read_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/punches")
                    .wrap(Governor::new(&ingest_limiter))
                    .service(
                        web::resource("/ingest").route(web::post().to(ingest::ingest_punches)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .wrap(Governor::new(&read_limiter))
                    // /attendance
                    .service(
                        web::resource("").route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/{employee_id}/{date}/override
                    .service(
                        web::resource("/{employee_id}/{date}/override")
                            .route(web::put().to(overrides::submit_override))
                            .route(web::delete().to(overrides::clear_override)),
                    )
                    // /attendance/{employee_id}/{date}/punches
                    .service(
                        web::resource("/{employee_id}/{date}/punches")
                            .route(web::get().to(attendance::list_day_punches)),
                    )
                    // /attendance/{employee_id}/{date}
                    .service(
                        web::resource("/{employee_id}/{date}")
                            .route(web::get().to(attendance::get_attendance_day)),
                    ),
            )
            .service(
                web::scope("/sweeper")
                    .wrap(Governor::new(&admin_limiter))
                    .service(web::resource("/run").route(web::post().to(sweeper::run_sweep)))
                    .service(
                        web::resource("/preview").route(web::get().to(sweeper::preview_sweep)),
                    ),
            )
            .service(
                web::scope("/backfill")
                    .wrap(Governor::new(&admin_limiter))
                    .service(web::resource("/run").route(web::post().to(backfill::run_backfill)))
                    .service(
                        web::resource("/preview").route(web::post().to(backfill::preview_backfill)),
                    ),
            )
            .service(
                web::scope("/identity")
                    .wrap(Governor::new(&admin_limiter))
                    .service(
                        web::resource("/resolve").route(web::post().to(identity::resolve_identity)),
                    )
                    .service(
                        web::resource("/mappings")
                            .route(web::get().to(identity::list_mappings))
                            .route(web::post().to(identity::create_mapping)),
                    )
                    .service(
                        web::resource("/mappings/{id}")
                            .route(web::put().to(identity::update_mapping))
                            .route(web::delete().to(identity::deactivate_mapping)),
                    ),
            )
            .service(
                web::scope("/work-week")
                    .wrap(Governor::new(&admin_limiter))
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(work_week::get_work_week))
                            .route(web::put().to(work_week::put_work_week)),
                    ),
            )
            .service(
                web::scope("/operations")
                    .wrap(Governor::new(&admin_limiter))
                    .service(
                        web::resource("").route(web::get().to(operations::list_operations)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .wrap(Governor::new(&admin_limiter))
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(employee::get_employee)),
                    ),
            ),
    );
}

// PROVIDER SYNC
//  ├─ POST /punches/ingest        (dedup + derive, retry-safe)
//  └─ errors per record, batch never aborts
//
// END OF DAY
//  └─ POST /sweeper/run           (close open entries at default checkout)
//
// MONTH CLOSE
//  └─ POST /backfill/run          (absent/holiday for silent days)
