/// States as listed in the portal's state dropdown (`id`, `name`).
///
/// The ids are the portal's own option values; a few non-geographic school
/// bodies (KVS, NVS, Sainik Schools) are listed as states by the portal.
pub(super) const STATES: &[(&str, &str)] = &[
    ("1", "Andaman And Nicobar"),
    ("2", "Andhra Pradesh"),
    ("3", "Arunachal Pradesh"),
    ("4", "Assam"),
    ("5", "Bihar"),
    ("6", "Chandigarh"),
    ("7", "Chhattisgarh"),
    ("42", "Dadra And Nagar Haveli And Daman And Diu"),
    ("10", "Delhi"),
    ("11", "Goa"),
    ("12", "Gujarat"),
    ("13", "Haryana"),
    ("14", "Himachal Pradesh"),
    ("15", "Jammu And Kashmir"),
    ("16", "Jharkhand"),
    ("17", "Karnataka"),
    ("36", "Kendriya Vidyalaya Sangathan"),
    ("18", "Kerala"),
    ("40", "Ladakh"),
    ("19", "Lakshadweep"),
    ("20", "Madhya Pradesh"),
    ("21", "Maharashtra"),
    ("22", "Manipur"),
    ("23", "Meghalaya"),
    ("24", "Mizoram"),
    ("25", "Nagaland"),
    ("37", "Navodaya Vidyalaya Samiti"),
    ("26", "Odisha"),
    ("27", "Puducherry"),
    ("28", "Punjab"),
    ("29", "Rajasthan"),
    ("38", "Sainik Schools Society"),
    ("30", "Sikkim"),
    ("31", "Tamil Nadu"),
    ("39", "Telangana"),
    ("32", "Tripura"),
    ("33", "Uttar Pradesh"),
    ("34", "Uttarakhand"),
    ("35", "West Bengal"),
];
