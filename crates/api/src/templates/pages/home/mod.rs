use maud::{html, Markup};

/// Route listing served at `/`
const ROUTES: [(&str, &str); 5] = [
    (
        "/api/v1.0/precipitation",
        "Last 12 months of precipitation data",
    ),
    ("/api/v1.0/stations", "List of all weather stations"),
    (
        "/api/v1.0/tobs",
        "Temperature observations from the most active station",
    ),
    (
        "/api/v1.0/<start>",
        "Min, Avg, and Max temperatures from the start date (yyyy-mm-dd)",
    ),
    (
        "/api/v1.0/<start>/<end>",
        "Min, Avg, and Max temperatures from start to end date (yyyy-mm-dd)",
    ),
];

/// Plain help fragment, no layout or styling
pub fn home_page() -> Markup {
    html! {
        "Available Routes:"
        br;
        br;
        @for (index, (path, description)) in ROUTES.iter().enumerate() {
            @if index > 0 {
                br;
                br;
            }
            (path)
            br;
            "- " (description)
        }
    }
}
