use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct SeedCmd {
    #[arg(long, value_name = "USERNAME", help = "Login username")]
    pub username: String,

    #[arg(long, value_name = "NAME", help = "Display name")]
    pub name: String,

    #[arg(long, value_name = "EMAIL", help = "Email address")]
    pub email: String,

    #[arg(
        long,
        value_name = "PASSWORD",
        help = "Password; prompted interactively when omitted"
    )]
    pub password: Option<String>,

    #[arg(
        long,
        default_value = "1000.00",
        value_name = "AMOUNT",
        help = "Opening balance for the seeded account"
    )]
    pub balance: String,
}
