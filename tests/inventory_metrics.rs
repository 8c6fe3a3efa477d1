mod common;

use adopto_server::repositories::NewOrg;
use common::{photo, register, Harness};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

fn gauge(handle: &PrometheusHandle, name: &str) -> f64 {
    handle
        .render()
        .lines()
        .find_map(|line| line.strip_prefix(name)?.strip_prefix(' ')?.trim().parse().ok())
        .unwrap_or(0.0)
}

#[test]
fn inventory_gauges_follow_the_lifecycle() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            let h = Harness::new();
            let org = h
                .org_service
                .register_org(NewOrg {
                    name: "Happy Paws".into(),
                    email: "paws@shelter.org".into(),
                    whatsapp: "+5581999999999".into(),
                    address: "Rua A, 10".into(),
                    city: "Recife".into(),
                    zip_code: "50000-000".into(),
                })
                .await
                .unwrap();

            let kept = h
                .pet_service
                .register_pet(register(org.id, vec![photo(b"a", "a.png"), photo(b"b", "b.png")]))
                .await
                .unwrap();
            let dropped = h
                .pet_service
                .register_pet(register(org.id, vec![photo(b"c", "c.png")]))
                .await
                .unwrap();
            assert_eq!(gauge(&handle, "adopto_orgs_total"), 1.0);
            assert_eq!(gauge(&handle, "adopto_pets_total"), 2.0);
            assert_eq!(gauge(&handle, "adopto_photos_total"), 3.0);

            h.pet_service
                .update_pet(common::update(kept.pet.id, org.id, vec![photo(b"a", "a.png")]))
                .await
                .unwrap();
            assert_eq!(gauge(&handle, "adopto_photos_total"), 2.0);

            h.pet_service.delete_pet(dropped.pet.id, org.id).await.unwrap();
            assert_eq!(gauge(&handle, "adopto_pets_total"), 1.0);

            h.org_service.delete_org(org.id).await.unwrap();
            assert_eq!(gauge(&handle, "adopto_orgs_total"), 0.0);
            assert_eq!(gauge(&handle, "adopto_pets_total"), 0.0);
        })
    });
}
