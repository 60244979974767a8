//! Built-in data used when no snapshot can be restored.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::models::delivery::{
    Address, Coordinates, Customer, Delivery, DeliveryLocation, DeliveryStatus, LegType, Priority,
};
use crate::models::driver::{DeliveryMetrics, Driver, MetricsWindow, Vehicle, VehicleType};
use crate::models::pet::{Pet, PetSpecies};
use crate::state::StoreState;

const SAO_PAULO_OFFSET_SECS: i32 = 3 * 3600;

pub fn initial_state() -> StoreState {
    StoreState {
        deliveries: deliveries(),
        driver: Some(driver()),
        is_loading: false,
        selected_delivery: None,
    }
}

pub fn driver() -> Driver {
    Driver {
        id: "1".to_string(),
        name: "João Silva".to_string(),
        email: "joao@petdelivery.com".to_string(),
        phone: "(11) 99999-9999".to_string(),
        avatar: None,
        vehicle: Vehicle {
            kind: VehicleType::Car,
            plate: "ABC-1234".to_string(),
            model: "Honda Civic".to_string(),
            color: "Branco".to_string(),
        },
        current_location: None,
        is_online: true,
        metrics: DeliveryMetrics {
            today: window(8, 6, 480.0, 45.0),
            week: window(42, 38, 2850.0, 280.0),
            month: window(156, 142, 11400.0, 1120.0),
        },
    }
}

pub fn deliveries() -> Vec<Delivery> {
    vec![
        Delivery {
            id: "1".to_string(),
            pet: pet(
                "p1",
                "Rex",
                PetSpecies::Dog,
                "Golden Retriever",
                25.0,
                "Cão muito amigável, gosta de carinho",
            ),
            status: DeliveryStatus::Pending,
            priority: Priority::High,
            pickup: leg(
                "pickup1",
                LegType::Pickup,
                customer("c1", "Maria Santos", "(11) 98888-8888", Some("maria@email.com")),
                address(
                    "Rua das Flores",
                    "123",
                    "Vila Madalena",
                    "05433-000",
                    -23.5489,
                    -46.6388,
                ),
                local(2024, 1, 15, 9, 0),
                None,
            ),
            delivery: leg(
                "delivery1",
                LegType::Delivery,
                customer("c2", "Pet Shop Central", "(11) 97777-7777", None),
                address(
                    "Av. Paulista",
                    "1000",
                    "Bela Vista",
                    "01310-100",
                    -23.5618,
                    -46.6565,
                ),
                local(2024, 1, 15, 10, 30),
                None,
            ),
            scheduled_date: local(2024, 1, 15, 9, 0),
            estimated_duration: 90,
            actual_duration: None,
            distance: 8.5,
            price: 75.0,
            driver_notes: None,
            customer_notes: Some("Pet precisa tomar medicação às 11h".to_string()),
            created_at: local(2024, 1, 14, 15, 30),
            updated_at: local(2024, 1, 14, 15, 30),
        },
        Delivery {
            id: "2".to_string(),
            pet: pet(
                "p2",
                "Luna",
                PetSpecies::Cat,
                "Persa",
                4.0,
                "Gata tímida, usar transportadora",
            ),
            status: DeliveryStatus::Collected,
            priority: Priority::Medium,
            pickup: leg(
                "pickup2",
                LegType::Pickup,
                customer("c3", "Carlos Oliveira", "(11) 96666-6666", None),
                address(
                    "Rua Augusta",
                    "456",
                    "Consolação",
                    "01305-000",
                    -23.5556,
                    -46.6624,
                ),
                local(2024, 1, 15, 8, 30),
                Some(local(2024, 1, 15, 8, 35)),
            ),
            delivery: leg(
                "delivery2",
                LegType::Delivery,
                customer("c4", "Clínica Veterinária Vida", "(11) 95555-5555", None),
                address(
                    "Rua Teodoro Sampaio",
                    "789",
                    "Pinheiros",
                    "05405-000",
                    -23.5647,
                    -46.6925,
                ),
                local(2024, 1, 15, 10, 0),
                None,
            ),
            scheduled_date: local(2024, 1, 15, 8, 30),
            estimated_duration: 60,
            actual_duration: None,
            distance: 6.2,
            price: 50.0,
            driver_notes: None,
            customer_notes: None,
            created_at: local(2024, 1, 14, 14, 20),
            updated_at: local(2024, 1, 15, 8, 35),
        },
        Delivery {
            id: "3".to_string(),
            pet: pet(
                "p3",
                "Charlie",
                PetSpecies::Dog,
                "Bulldog",
                18.0,
                "Cuidado com o calor, oferecer água",
            ),
            status: DeliveryStatus::Delivered,
            priority: Priority::Low,
            pickup: leg(
                "pickup3",
                LegType::Pickup,
                customer("c5", "Ana Costa", "(11) 94444-4444", None),
                address(
                    "Rua da Consolação",
                    "234",
                    "Centro",
                    "01301-000",
                    -23.5431,
                    -46.6291,
                ),
                local(2024, 1, 15, 7, 0),
                Some(local(2024, 1, 15, 7, 10)),
            ),
            delivery: leg(
                "delivery3",
                LegType::Delivery,
                customer("c6", "Roberto Lima", "(11) 93333-3333", None),
                address(
                    "Av. Faria Lima",
                    "567",
                    "Itaim Bibi",
                    "04538-000",
                    -23.5781,
                    -46.6906,
                ),
                local(2024, 1, 15, 8, 30),
                Some(local(2024, 1, 15, 8, 25)),
            ),
            scheduled_date: local(2024, 1, 15, 7, 0),
            estimated_duration: 90,
            actual_duration: Some(85),
            distance: 12.3,
            price: 95.0,
            driver_notes: None,
            customer_notes: None,
            created_at: local(2024, 1, 14, 13, 15),
            updated_at: local(2024, 1, 15, 8, 25),
        },
    ]
}

fn window(deliveries: u32, completed: u32, revenue: f64, distance: f64) -> MetricsWindow {
    MetricsWindow {
        deliveries,
        completed,
        revenue,
        distance,
    }
}

fn pet(
    id: &str,
    name: &str,
    species: PetSpecies,
    breed: &str,
    weight: f64,
    instructions: &str,
) -> Pet {
    Pet {
        id: id.to_string(),
        name: name.to_string(),
        species,
        breed: Some(breed.to_string()),
        weight: Some(weight),
        special_instructions: Some(instructions.to_string()),
        photo: None,
    }
}

fn address(
    street: &str,
    number: &str,
    neighborhood: &str,
    zip_code: &str,
    lat: f64,
    lng: f64,
) -> Address {
    Address {
        street: street.to_string(),
        number: number.to_string(),
        neighborhood: neighborhood.to_string(),
        city: "São Paulo".to_string(),
        zip_code: zip_code.to_string(),
        coordinates: Some(Coordinates { lat, lng }),
    }
}

struct Contact {
    id: &'static str,
    name: &'static str,
    phone: &'static str,
    email: Option<&'static str>,
}

fn customer(
    id: &'static str,
    name: &'static str,
    phone: &'static str,
    email: Option<&'static str>,
) -> Contact {
    Contact {
        id,
        name,
        phone,
        email,
    }
}

fn leg(
    id: &str,
    leg: LegType,
    contact: Contact,
    address: Address,
    scheduled_time: DateTime<Utc>,
    completed_time: Option<DateTime<Utc>>,
) -> DeliveryLocation {
    let customer = Customer {
        id: contact.id.to_string(),
        name: contact.name.to_string(),
        phone: contact.phone.to_string(),
        email: contact.email.map(str::to_string),
        address: address.clone(),
    };

    DeliveryLocation {
        id: id.to_string(),
        leg,
        customer,
        address,
        scheduled_time,
        completed_time,
        notes: None,
        photos: None,
        signature: None,
    }
}

/// Wall-clock time in São Paulo (UTC-3), stored as UTC.
fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    FixedOffset::west_opt(SAO_PAULO_OFFSET_SECS)
        .and_then(|tz| {
            tz.with_ymd_and_hms(year, month, day, hour, minute, 0)
                .single()
        })
        .map(|time| time.with_timezone(&Utc))
        .unwrap_or_default()
}
