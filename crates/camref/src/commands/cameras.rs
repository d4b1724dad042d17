use camref_axxon::{list_cameras, CameraRecord, Client};

struct Table {
    names: Vec<String>,
    ids: Vec<String>,
    ip_addresses: Vec<String>,
    access_points: Vec<String>,
}

impl Table {
    fn new() -> Self {
        Self {
            names: vec!["NAME".to_string()],
            ids: vec!["ID".to_string()],
            ip_addresses: vec!["IP ADDRESS".to_string()],
            access_points: vec!["ACCESS POINT".to_string()],
        }
    }

    fn push(&mut self, row: CameraRecord) {
        let CameraRecord {
            id,
            name,
            access_point,
            ip_address,
        } = row;
        self.names.push(name);
        self.ids.push(id);
        self.ip_addresses.push(ip_address);
        self.access_points.push(access_point);
    }

    fn pretty_print(self) {
        let Self {
            names,
            ids,
            ip_addresses,
            access_points,
        } = self;
        let width =
            |column: &[String]| 1 + column.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let name_width = width(&names);
        let id_width = width(&ids);
        let ip_width = width(&ip_addresses);

        for (((name, id), ip_address), access_point) in names
            .into_iter()
            .zip(ids)
            .zip(ip_addresses)
            .zip(access_points)
        {
            println!("{name:name_width$} {id:id_width$} {ip_address:ip_width$} {access_point}");
        }
    }
}

#[derive(Clone, Debug, clap::Parser)]
pub struct CamerasCommand {
    /// Print the cameras as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

impl CamerasCommand {
    pub async fn exec(self, client: &Client) -> anyhow::Result<()> {
        let Self { json } = self;
        let cameras = list_cameras().send(client).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&cameras)?);
            return Ok(());
        }
        let mut table = Table::new();
        for camera in cameras {
            table.push(camera);
        }
        table.pretty_print();
        Ok(())
    }
}
